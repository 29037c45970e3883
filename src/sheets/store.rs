//! Sheet definition store
//!
//! Create and update always replace the whole column list. Both validate the
//! definition first and persist nothing when it is invalid. Instances belong
//! to their sheet and are removed with it.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::info;

use super::column::{validate_definition, ColumnDeclaration};
use super::definition::{NewSheet, SheetDefinition, SheetSummary};
use super::instance::{
    sort_instances, InstanceCells, InstanceSummary, NewSheetInstance, SheetInstance,
};
use crate::error::{Result, SheetError};

#[async_trait]
pub trait SheetStore: Send + Sync {
    /// Persists a new sheet and returns its assigned id
    async fn create(&self, sheet: NewSheet) -> Result<i32>;

    async fn get(&self, sheet_id: i32) -> Result<Option<SheetDefinition>>;

    /// Locked sheets first, then by name
    async fn list(&self) -> Result<Vec<SheetSummary>>;

    /// Replaces name and columns; `NotFound` when no row was updated
    async fn update(&self, sheet_id: i32, name: &str, columns: &[ColumnDeclaration])
        -> Result<()>;

    /// `NotFound` when no row was deleted, `Locked` when the sheet is locked
    async fn delete(&self, sheet_id: i32) -> Result<()>;

    /// Like `get`, but a missing sheet is an error
    async fn require(&self, sheet_id: i32) -> Result<SheetDefinition> {
        self.get(sheet_id)
            .await?
            .ok_or(SheetError::NotFound(sheet_id))
    }

    /// Persists an instance and returns its id; `NotFound` when the sheet
    /// does not exist
    async fn create_instance(&self, instance: NewSheetInstance) -> Result<i32>;

    async fn get_instance(&self, instance_id: i32) -> Result<Option<SheetInstance>>;

    /// Instances of one sheet, or of every sheet when `sheet_id` is `None`,
    /// newest first
    async fn list_instances(&self, sheet_id: Option<i32>) -> Result<Vec<InstanceSummary>>;

    /// Replaces the captured cells of an instance
    async fn save_instance_cells(&self, instance_id: i32, cells: &InstanceCells) -> Result<()>;

    async fn require_instance(&self, instance_id: i32) -> Result<SheetInstance> {
        self.get_instance(instance_id)
            .await?
            .ok_or(SheetError::InstanceNotFound(instance_id))
    }
}

pub(crate) fn sort_summaries(summaries: &mut [SheetSummary]) {
    summaries.sort_by(|a, b| b.locked.cmp(&a.locked).then_with(|| a.name.cmp(&b.name)));
}

#[derive(Default)]
struct MemoryState {
    next_id: i32,
    sheets: BTreeMap<i32, SheetDefinition>,
    next_instance_id: i32,
    instances: BTreeMap<i32, SheetInstance>,
}

/// Sheet store kept in process memory
#[derive(Default)]
pub struct InMemorySheetStore {
    state: RwLock<MemoryState>,
}

impl InMemorySheetStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SheetStore for InMemorySheetStore {
    async fn create(&self, sheet: NewSheet) -> Result<i32> {
        validate_definition(&sheet.name, &sheet.columns)?;

        let mut state = self.state.write().await;
        state.next_id += 1;
        let id = state.next_id;
        state.sheets.insert(
            id,
            SheetDefinition {
                id,
                name: sheet.name,
                columns: sheet.columns,
                created_by: sheet.created_by,
                locked: sheet.locked,
            },
        );
        info!("Created sheet {}", id);
        Ok(id)
    }

    async fn get(&self, sheet_id: i32) -> Result<Option<SheetDefinition>> {
        Ok(self.state.read().await.sheets.get(&sheet_id).cloned())
    }

    async fn list(&self) -> Result<Vec<SheetSummary>> {
        let state = self.state.read().await;
        let mut summaries: Vec<SheetSummary> =
            state.sheets.values().map(SheetSummary::from).collect();
        sort_summaries(&mut summaries);
        Ok(summaries)
    }

    async fn update(
        &self,
        sheet_id: i32,
        name: &str,
        columns: &[ColumnDeclaration],
    ) -> Result<()> {
        validate_definition(name, columns)?;

        let mut state = self.state.write().await;
        let sheet = state
            .sheets
            .get_mut(&sheet_id)
            .ok_or(SheetError::NotFound(sheet_id))?;
        sheet.name = name.to_string();
        sheet.columns = columns.to_vec();
        info!("Updated sheet {}", sheet_id);
        Ok(())
    }

    async fn delete(&self, sheet_id: i32) -> Result<()> {
        let mut state = self.state.write().await;
        match state.sheets.get(&sheet_id) {
            None => Err(SheetError::NotFound(sheet_id)),
            Some(sheet) if sheet.locked => Err(SheetError::Locked(sheet_id)),
            Some(_) => {
                state.sheets.remove(&sheet_id);
                state
                    .instances
                    .retain(|_, instance| instance.sheet_id != sheet_id);
                info!("Deleted sheet {}", sheet_id);
                Ok(())
            }
        }
    }

    async fn create_instance(&self, instance: NewSheetInstance) -> Result<i32> {
        let mut state = self.state.write().await;
        if !state.sheets.contains_key(&instance.sheet_id) {
            return Err(SheetError::NotFound(instance.sheet_id));
        }

        state.next_instance_id += 1;
        let id = state.next_instance_id;
        state.instances.insert(
            id,
            SheetInstance {
                id,
                sheet_id: instance.sheet_id,
                date_created: Utc::now(),
                herd_name: instance.herd_name,
                breeding_year: instance.breeding_year,
                created_by: instance.created_by,
                row_keys: instance.row_keys,
                cells: instance.cells,
            },
        );
        info!("Created instance {} of sheet {}", id, instance.sheet_id);
        Ok(id)
    }

    async fn get_instance(&self, instance_id: i32) -> Result<Option<SheetInstance>> {
        Ok(self.state.read().await.instances.get(&instance_id).cloned())
    }

    async fn list_instances(&self, sheet_id: Option<i32>) -> Result<Vec<InstanceSummary>> {
        let state = self.state.read().await;
        let mut summaries: Vec<InstanceSummary> = state
            .instances
            .values()
            .filter(|instance| sheet_id.map_or(true, |id| instance.sheet_id == id))
            .filter_map(|instance| {
                let sheet = state.sheets.get(&instance.sheet_id)?;
                Some(InstanceSummary {
                    instance_id: instance.id,
                    sheet_id: instance.sheet_id,
                    sheet_name: sheet.name.clone(),
                    date_created: instance.date_created,
                    herd_name: instance.herd_name.clone(),
                    breeding_year: instance.breeding_year,
                    created_by: instance.created_by.clone(),
                })
            })
            .collect();
        sort_instances(&mut summaries);
        Ok(summaries)
    }

    async fn save_instance_cells(&self, instance_id: i32, cells: &InstanceCells) -> Result<()> {
        let mut state = self.state.write().await;
        let instance = state
            .instances
            .get_mut(&instance_id)
            .ok_or(SheetError::InstanceNotFound(instance_id))?;
        instance.cells = cells.clone();
        info!("Saved cells of instance {}", instance_id);
        Ok(())
    }
}
