//! Postgres sheet store
//!
//! Columns are stored as JSON text (`{"columns": [...]}`) in a single column
//! and parsed back on read. Instances keep their row keys and captured cells
//! as JSON text the same way.

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::info;

use crate::error::{Result, SheetError};
use crate::sheets::column::{validate_definition, ColumnDeclaration, SheetColumns};
use crate::sheets::definition::{NewSheet, SheetDefinition, SheetSummary};
use crate::sheets::instance::{InstanceCells, InstanceSummary, NewSheetInstance, SheetInstance};
use crate::sheets::store::SheetStore;

#[derive(Debug, FromRow)]
struct SheetRow {
    id: i32,
    sheet_name: String,
    columns: String,
    created_by: Option<String>,
    locked: bool,
}

impl TryFrom<SheetRow> for SheetDefinition {
    type Error = SheetError;

    fn try_from(row: SheetRow) -> Result<Self> {
        Ok(SheetDefinition {
            id: row.id,
            name: row.sheet_name,
            columns: SheetColumns::from_json(&row.columns)?.columns,
            created_by: row.created_by.unwrap_or_default(),
            locked: row.locked,
        })
    }
}

#[derive(Debug, FromRow)]
struct SummaryRow {
    id: i32,
    sheet_name: String,
    created_by: Option<String>,
    locked: bool,
}

impl From<SummaryRow> for SheetSummary {
    fn from(row: SummaryRow) -> Self {
        SheetSummary {
            id: row.id,
            name: row.sheet_name,
            created_by: row.created_by.unwrap_or_default(),
            locked: row.locked,
        }
    }
}

#[derive(Debug, FromRow)]
struct InstanceRow {
    id: i32,
    sheet_id: i32,
    date_created: DateTime<Utc>,
    column_data: String,
    row_data: String,
    created_by: Option<String>,
    herd_name: Option<String>,
    breeding_year: Option<i32>,
}

impl TryFrom<InstanceRow> for SheetInstance {
    type Error = SheetError;

    fn try_from(row: InstanceRow) -> Result<Self> {
        Ok(SheetInstance {
            id: row.id,
            sheet_id: row.sheet_id,
            date_created: row.date_created,
            herd_name: row.herd_name,
            breeding_year: row.breeding_year,
            created_by: row.created_by.unwrap_or_default(),
            row_keys: serde_json::from_str(&row.row_data)?,
            cells: serde_json::from_str(&row.column_data)?,
        })
    }
}

#[derive(Debug, FromRow)]
struct InstanceSummaryRow {
    instance_id: i32,
    sheet_id: i32,
    sheet_name: String,
    date_created: DateTime<Utc>,
    herd_name: Option<String>,
    breeding_year: Option<i32>,
    created_by: Option<String>,
}

impl From<InstanceSummaryRow> for InstanceSummary {
    fn from(row: InstanceSummaryRow) -> Self {
        InstanceSummary {
            instance_id: row.instance_id,
            sheet_id: row.sheet_id,
            sheet_name: row.sheet_name,
            date_created: row.date_created,
            herd_name: row.herd_name,
            breeding_year: row.breeding_year,
            created_by: row.created_by.unwrap_or_default(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct PgSheetStore {
    pool: PgPool,
}

impl PgSheetStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SheetStore for PgSheetStore {
    async fn create(&self, sheet: NewSheet) -> Result<i32> {
        validate_definition(&sheet.name, &sheet.columns)?;
        let columns = SheetColumns::to_json(&sheet.columns)?;

        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO sheets (sheet_name, columns, created_by, locked)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&sheet.name)
        .bind(&columns)
        .bind(&sheet.created_by)
        .bind(sheet.locked)
        .fetch_one(&self.pool)
        .await
        .context("Failed to create sheet")?;

        info!("Created sheet '{}' with ID: {}", sheet.name, id);
        Ok(id)
    }

    async fn get(&self, sheet_id: i32) -> Result<Option<SheetDefinition>> {
        let row = sqlx::query_as::<_, SheetRow>(
            r#"
            SELECT id, sheet_name, columns, created_by, locked
            FROM sheets
            WHERE id = $1
            "#,
        )
        .bind(sheet_id)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Failed to load sheet {}", sheet_id))?;

        row.map(SheetDefinition::try_from).transpose()
    }

    async fn list(&self) -> Result<Vec<SheetSummary>> {
        let rows = sqlx::query_as::<_, SummaryRow>(
            r#"
            SELECT id, sheet_name, created_by, locked
            FROM sheets
            ORDER BY locked DESC, sheet_name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list sheets")?;

        Ok(rows.into_iter().map(SheetSummary::from).collect())
    }

    async fn update(
        &self,
        sheet_id: i32,
        name: &str,
        columns: &[ColumnDeclaration],
    ) -> Result<()> {
        validate_definition(name, columns)?;
        let columns = SheetColumns::to_json(columns)?;

        let result = sqlx::query("UPDATE sheets SET sheet_name = $1, columns = $2 WHERE id = $3")
            .bind(name)
            .bind(&columns)
            .bind(sheet_id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to update sheet {}", sheet_id))?;

        if result.rows_affected() == 0 {
            return Err(SheetError::NotFound(sheet_id));
        }

        info!("Updated sheet {}", sheet_id);
        Ok(())
    }

    async fn delete(&self, sheet_id: i32) -> Result<()> {
        let result = sqlx::query("DELETE FROM sheets WHERE id = $1 AND locked = FALSE")
            .bind(sheet_id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to delete sheet {}", sheet_id))?;

        if result.rows_affected() > 0 {
            info!("Deleted sheet {}", sheet_id);
            return Ok(());
        }

        let locked: Option<bool> = sqlx::query_scalar("SELECT locked FROM sheets WHERE id = $1")
            .bind(sheet_id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to check sheet {}", sheet_id))?;

        match locked {
            Some(true) => Err(SheetError::Locked(sheet_id)),
            _ => Err(SheetError::NotFound(sheet_id)),
        }
    }

    async fn create_instance(&self, instance: NewSheetInstance) -> Result<i32> {
        let column_data = serde_json::to_string(&instance.cells)?;
        let row_data = serde_json::to_string(&instance.row_keys)?;

        let id: Option<i32> = sqlx::query_scalar(
            r#"
            INSERT INTO sheet_instances
                (sheet_id, column_data, row_data, created_by, herd_name, breeding_year)
            SELECT id, $2, $3, $4, $5, $6
            FROM sheets
            WHERE id = $1
            RETURNING id
            "#,
        )
        .bind(instance.sheet_id)
        .bind(&column_data)
        .bind(&row_data)
        .bind(&instance.created_by)
        .bind(&instance.herd_name)
        .bind(instance.breeding_year)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Failed to create instance of sheet {}", instance.sheet_id))?;

        let id = id.ok_or(SheetError::NotFound(instance.sheet_id))?;
        info!(
            "Created instance {} of sheet {} with {} rows",
            id,
            instance.sheet_id,
            instance.row_keys.len()
        );
        Ok(id)
    }

    async fn get_instance(&self, instance_id: i32) -> Result<Option<SheetInstance>> {
        let row = sqlx::query_as::<_, InstanceRow>(
            r#"
            SELECT id, sheet_id, date_created, column_data, row_data,
                   created_by, herd_name, breeding_year
            FROM sheet_instances
            WHERE id = $1
            "#,
        )
        .bind(instance_id)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Failed to load sheet instance {}", instance_id))?;

        row.map(SheetInstance::try_from).transpose()
    }

    async fn list_instances(&self, sheet_id: Option<i32>) -> Result<Vec<InstanceSummary>> {
        let rows = sqlx::query_as::<_, InstanceSummaryRow>(
            r#"
            SELECT si.id AS instance_id, si.sheet_id, s.sheet_name, si.date_created,
                   si.herd_name, si.breeding_year, si.created_by
            FROM sheet_instances si
            JOIN sheets s ON s.id = si.sheet_id
            WHERE ($1::INTEGER IS NULL OR si.sheet_id = $1)
            ORDER BY si.date_created DESC, si.id DESC
            "#,
        )
        .bind(sheet_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list sheet instances")?;

        Ok(rows.into_iter().map(InstanceSummary::from).collect())
    }

    async fn save_instance_cells(&self, instance_id: i32, cells: &InstanceCells) -> Result<()> {
        let column_data = serde_json::to_string(cells)?;

        let result = sqlx::query("UPDATE sheet_instances SET column_data = $1 WHERE id = $2")
            .bind(&column_data)
            .bind(instance_id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to save cells of instance {}", instance_id))?;

        if result.rows_affected() == 0 {
            return Err(SheetError::InstanceNotFound(instance_id));
        }
        Ok(())
    }
}
