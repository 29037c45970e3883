//! Table assembly: sheet definition x row set x column router
//!
//! Also creates and loads sheet instances, which fix the row set and keep
//! captured values for the columns saved per instance.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::column::{ColumnDeclaration, ROW_KEY_COLUMN};
use super::instance::{
    instance_column_meta, CapturedCell, CapturedRow, CellUpdate, InstanceCells,
    InstanceMetadata, InstanceRequest, LoadedInstance, NewSheetInstance, SheetInstance,
    COPY_INSTANCE_SOURCE,
};
use super::router::ColumnRouter;
use super::row_set::RowSetSelector;
use super::store::SheetStore;
use crate::error::{Result, SheetError};
use crate::resolvers::ResolutionContext;
use crate::store::RanchStore;

/// Column metadata returned alongside resolved rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMeta {
    pub key: String,
    pub name: String,
    pub editable: bool,
    #[serde(rename = "type")]
    pub column_type: String,
}

impl From<&ColumnDeclaration> for ColumnMeta {
    fn from(column: &ColumnDeclaration) -> Self {
        Self {
            key: column.key.clone(),
            name: column.name.clone(),
            editable: column.is_fillable(),
            column_type: column.column_type.clone(),
        }
    }
}

pub type ResolvedRow = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedTable {
    pub columns: Vec<ColumnMeta>,
    pub data: Vec<ResolvedRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRequest {
    pub sheet_id: i32,
    #[serde(default)]
    pub herd_name: Option<String>,
    #[serde(default)]
    pub breeding_year: Option<i32>,
}

impl ResolveRequest {
    pub fn new(sheet_id: i32) -> Self {
        Self {
            sheet_id,
            ..Default::default()
        }
    }

    pub fn for_herd(mut self, herd_name: impl Into<String>) -> Self {
        self.herd_name = Some(herd_name.into());
        self
    }

    pub fn for_breeding_year(mut self, breeding_year: i32) -> Self {
        self.breeding_year = Some(breeding_year);
        self
    }
}

pub struct SheetAssembler {
    sheets: Arc<dyn SheetStore>,
    rows: RowSetSelector,
    router: ColumnRouter,
}

impl SheetAssembler {
    pub fn new(sheets: Arc<dyn SheetStore>, ranch: Arc<dyn RanchStore>) -> Self {
        Self {
            sheets,
            rows: RowSetSelector::new(ranch.clone()),
            router: ColumnRouter::new(ranch),
        }
    }

    /// Resolves a sheet dated today
    pub async fn resolve_sheet(&self, request: &ResolveRequest) -> Result<ResolvedTable> {
        self.resolve_sheet_with(request, ResolutionContext::today()).await
    }

    /// Resolves a sheet against an explicit context. The request's breeding
    /// year replaces the context's.
    pub async fn resolve_sheet_with(
        &self,
        request: &ResolveRequest,
        ctx: ResolutionContext,
    ) -> Result<ResolvedTable> {
        let ctx = ctx.with_breeding_year(request.breeding_year);
        let sheet = self.sheets.require(request.sheet_id).await?;
        let row_keys = self.rows.row_keys(request.herd_name.as_deref()).await?;

        info!(
            "Resolving sheet {} ({}) for {} rows",
            sheet.id,
            sheet.name,
            row_keys.len()
        );

        let mut data = Vec::with_capacity(row_keys.len());
        for row_key in &row_keys {
            data.push(self.resolve_row(row_key, &sheet.columns, &ctx).await);
        }

        Ok(ResolvedTable {
            columns: sheet.columns.iter().map(ColumnMeta::from).collect(),
            data,
        })
    }

    /// Captures a new instance of a sheet dated today
    pub async fn create_instance(&self, request: &InstanceRequest) -> Result<i32> {
        self.create_instance_with(request, ResolutionContext::today()).await
    }

    /// Fixes the current row set and captures every saved-per-instance cell
    pub async fn create_instance_with(
        &self,
        request: &InstanceRequest,
        ctx: ResolutionContext,
    ) -> Result<i32> {
        let ctx = ctx.with_breeding_year(request.breeding_year);
        let sheet = self.sheets.require(request.sheet_id).await?;
        let row_keys = self.rows.row_keys(request.herd_name.as_deref()).await?;

        let saved: Vec<&ColumnDeclaration> = sheet
            .columns
            .iter()
            .filter(|column| column.saved_per_instance)
            .collect();
        for column in &saved {
            if column.instance_source.as_deref() != Some(COPY_INSTANCE_SOURCE) {
                debug!(
                    "Column {} of sheet {} is captured by value",
                    column.key, sheet.id
                );
            }
        }

        let mut cells = InstanceCells::new();
        for row_key in &row_keys {
            let values = self.resolve_cells(row_key, &saved, &ctx).await;
            let captured: CapturedRow = saved
                .iter()
                .zip(values)
                .map(|(column, value)| (column.key.clone(), CapturedCell::copy(value)))
                .collect();
            cells.insert(row_key.clone(), captured);
        }

        let id = self
            .sheets
            .create_instance(NewSheetInstance {
                sheet_id: sheet.id,
                herd_name: request.herd_name.clone(),
                breeding_year: request.breeding_year,
                created_by: request
                    .created_by
                    .clone()
                    .unwrap_or_else(|| "Unknown".to_string()),
                row_keys,
                cells,
            })
            .await?;

        info!(
            "Created instance {} of sheet {} ({}) with {} saved columns",
            id,
            sheet.id,
            sheet.name,
            saved.len()
        );
        Ok(id)
    }

    /// Loads an instance dated today
    pub async fn load_instance(&self, instance_id: i32) -> Result<LoadedInstance> {
        self.load_instance_with(instance_id, ResolutionContext::today()).await
    }

    /// Rows come from the instance, saved columns from its captured cells and
    /// the remaining columns are resolved live under the instance's breeding
    /// year. A saved column with no captured cell renders empty.
    pub async fn load_instance_with(
        &self,
        instance_id: i32,
        ctx: ResolutionContext,
    ) -> Result<LoadedInstance> {
        let instance = self.sheets.require_instance(instance_id).await?;
        let sheet = self.sheets.require(instance.sheet_id).await?;
        let ctx = ctx.with_breeding_year(instance.breeding_year);

        info!(
            "Loading instance {} of sheet {} for {} rows",
            instance.id,
            sheet.id,
            instance.row_keys.len()
        );

        let live: Vec<&ColumnDeclaration> = sheet
            .columns
            .iter()
            .filter(|column| !column.saved_per_instance)
            .collect();

        let mut data = Vec::with_capacity(instance.row_keys.len());
        for row_key in &instance.row_keys {
            let values = self.resolve_cells(row_key, &live, &ctx).await;
            let mut row = ResolvedRow::new();
            row.insert(ROW_KEY_COLUMN.to_string(), row_key.clone());
            for (column, value) in live.iter().zip(values) {
                row.insert(column.key.clone(), value);
            }
            for column in sheet.columns.iter().filter(|c| c.saved_per_instance) {
                let value = instance
                    .captured(row_key, &column.key)
                    .map(|cell| cell.value().to_string())
                    .unwrap_or_default();
                row.insert(column.key.clone(), value);
            }
            data.push(row);
        }

        Ok(LoadedInstance {
            instance_id: instance.id,
            sheet_id: sheet.id,
            sheet_name: sheet.name.clone(),
            date_created: instance.date_created,
            columns: sheet.columns.iter().map(instance_column_meta).collect(),
            data,
            metadata: InstanceMetadata {
                herd_name: instance.herd_name.clone(),
                breeding_year: instance.breeding_year,
                created_by: instance.created_by.clone(),
            },
        })
    }

    /// Overwrites one captured cell. Only saved-per-instance columns of rows
    /// in the instance can be edited.
    pub async fn update_instance_cell(&self, instance_id: i32, update: &CellUpdate) -> Result<()> {
        let instance = self.sheets.require_instance(instance_id).await?;
        let sheet = self.sheets.require(instance.sheet_id).await?;
        check_cell_update(&instance, &sheet.columns, update)?;

        let mut cells = instance.cells;
        cells
            .entry(update.row_key.clone())
            .or_default()
            .insert(update.column_key.clone(), CapturedCell::copy(&update.value));
        self.sheets.save_instance_cells(instance_id, &cells).await?;

        debug!(
            "Updated {} of row {} in instance {}",
            update.column_key, update.row_key, instance_id
        );
        Ok(())
    }

    async fn resolve_row(
        &self,
        row_key: &str,
        columns: &[ColumnDeclaration],
        ctx: &ResolutionContext,
    ) -> ResolvedRow {
        let columns: Vec<&ColumnDeclaration> = columns.iter().collect();
        let cells = self.resolve_cells(row_key, &columns, ctx).await;

        let mut row = ResolvedRow::new();
        row.insert(ROW_KEY_COLUMN.to_string(), row_key.to_string());
        for (column, value) in columns.iter().zip(cells) {
            row.insert(column.key.clone(), value);
        }
        debug!("Resolved row {}", row_key);
        row
    }

    /// Cells of one row, resolved concurrently, in column order
    async fn resolve_cells(
        &self,
        row_key: &str,
        columns: &[&ColumnDeclaration],
        ctx: &ResolutionContext,
    ) -> Vec<String> {
        join_all(
            columns
                .iter()
                .map(|column| self.router.resolve_cell(row_key, &column.data_path, ctx)),
        )
        .await
    }
}

fn check_cell_update(
    instance: &SheetInstance,
    columns: &[ColumnDeclaration],
    update: &CellUpdate,
) -> Result<()> {
    if !instance.has_row(&update.row_key) {
        return Err(SheetError::InvalidCellUpdate(format!(
            "row '{}' is not part of instance {}",
            update.row_key, instance.id
        )));
    }
    let saved = columns
        .iter()
        .any(|column| column.key == update.column_key && column.saved_per_instance);
    if !saved {
        return Err(SheetError::InvalidCellUpdate(format!(
            "column '{}' is not saved per instance",
            update.column_key
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheets::definition::NewSheet;
    use crate::sheets::store::InMemorySheetStore;
    use crate::store::{CowRecord, InMemoryRanchStore};
    use chrono::NaiveDate;

    fn ctx() -> ResolutionContext {
        ResolutionContext::new(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap())
    }

    #[tokio::test]
    async fn metadata_is_returned_for_empty_row_set() {
        let sheets = Arc::new(InMemorySheetStore::new());
        let id = sheets
            .create(NewSheet::new(
                "Empty",
                vec![
                    ColumnDeclaration::new("age", "Age", "Calculated/Age"),
                    ColumnDeclaration::new("note", "Notes", "Fillable/Notes").with_type("text"),
                ],
                "jo",
            ))
            .await
            .unwrap();
        let assembler = SheetAssembler::new(sheets, Arc::new(InMemoryRanchStore::new()));

        let table = assembler
            .resolve_sheet_with(&ResolveRequest::new(id), ctx())
            .await
            .unwrap();
        assert!(table.data.is_empty());
        assert_eq!(table.columns.len(), 2);
        assert!(!table.columns[0].editable);
        assert!(table.columns[1].editable);
    }

    #[tokio::test]
    async fn missing_sheet_fails_resolution() {
        let assembler = SheetAssembler::new(
            Arc::new(InMemorySheetStore::new()),
            Arc::new(InMemoryRanchStore::new().with_cow(CowRecord::new("1"))),
        );
        let err = assembler
            .resolve_sheet_with(&ResolveRequest::new(77), ctx())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn resolved_table_wire_shape() {
        let mut row = ResolvedRow::new();
        row.insert("CowTag".into(), "101".into());
        row.insert("age".into(), "4".into());
        let table = ResolvedTable {
            columns: vec![ColumnMeta::from(&ColumnDeclaration::new(
                "age",
                "Age",
                "Calculated/Age",
            ))],
            data: vec![row],
        };
        assert_eq!(
            serde_json::to_value(&table).unwrap(),
            serde_json::json!({
                "columns": [{"key": "age", "name": "Age", "editable": false, "type": "text"}],
                "data": [{"CowTag": "101", "age": "4"}]
            })
        );
    }

    #[test]
    fn request_reads_camel_case() {
        let request: ResolveRequest =
            serde_json::from_str(r#"{"sheetId": 3, "herdName": "North"}"#).unwrap();
        assert_eq!(request, ResolveRequest::new(3).for_herd("North"));
    }
}
