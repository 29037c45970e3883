//! Sheet instances
//!
//! An instance pins a sheet resolution to the row set it had when it was
//! created. Columns marked `savedPerInstance` keep the value captured at
//! creation (or a later edit); every other column is resolved live when the
//! instance is loaded, scoped to the instance's breeding year.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::assembler::{ColumnMeta, ResolvedRow};
use super::column::ColumnDeclaration;

/// Instance source that stores the resolved value itself
pub const COPY_INSTANCE_SOURCE: &str = "copy";

/// One captured cell, persisted as `{"value": ...}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapturedCell {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl CapturedCell {
    pub fn copy(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
        }
    }

    pub fn value(&self) -> &str {
        self.value.as_deref().unwrap_or_default()
    }
}

/// Captured cells of one row, by column key
pub type CapturedRow = BTreeMap<String, CapturedCell>;

/// Captured cells of an instance, by row key then column key
pub type InstanceCells = BTreeMap<String, CapturedRow>;

#[derive(Debug, Clone, PartialEq)]
pub struct SheetInstance {
    pub id: i32,
    pub sheet_id: i32,
    pub date_created: DateTime<Utc>,
    pub herd_name: Option<String>,
    pub breeding_year: Option<i32>,
    pub created_by: String,
    /// Row set fixed at creation, in resolution order
    pub row_keys: Vec<String>,
    pub cells: InstanceCells,
}

impl SheetInstance {
    pub fn captured(&self, row_key: &str, column_key: &str) -> Option<&CapturedCell> {
        self.cells.get(row_key)?.get(column_key)
    }

    pub fn has_row(&self, row_key: &str) -> bool {
        self.row_keys.iter().any(|key| key == row_key)
    }
}

/// Fields of an instance before the store assigns an id and a creation time
#[derive(Debug, Clone)]
pub struct NewSheetInstance {
    pub sheet_id: i32,
    pub herd_name: Option<String>,
    pub breeding_year: Option<i32>,
    pub created_by: String,
    pub row_keys: Vec<String>,
    pub cells: InstanceCells,
}

/// Listing entry for an instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceSummary {
    pub instance_id: i32,
    pub sheet_id: i32,
    pub sheet_name: String,
    pub date_created: DateTime<Utc>,
    pub herd_name: Option<String>,
    pub breeding_year: Option<i32>,
    pub created_by: String,
}

/// Newest first, ties broken by the higher id
pub(crate) fn sort_instances(summaries: &mut [InstanceSummary]) {
    summaries.sort_by(|a, b| {
        b.date_created
            .cmp(&a.date_created)
            .then_with(|| b.instance_id.cmp(&a.instance_id))
    });
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceRequest {
    pub sheet_id: i32,
    #[serde(default)]
    pub herd_name: Option<String>,
    #[serde(default)]
    pub breeding_year: Option<i32>,
    #[serde(default)]
    pub created_by: Option<String>,
}

impl InstanceRequest {
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

    pub fn created_by(mut self, created_by: impl Into<String>) -> Self {
        self.created_by = Some(created_by.into());
        self
    }
}

/// An edit to one saved cell of an instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellUpdate {
    #[serde(rename = "cowTag")]
    pub row_key: String,
    pub column_key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceMetadata {
    pub herd_name: Option<String>,
    pub breeding_year: Option<i32>,
    pub created_by: String,
}

/// A loaded instance: captured cells merged with live values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadedInstance {
    pub instance_id: i32,
    pub sheet_id: i32,
    pub sheet_name: String,
    pub date_created: DateTime<Utc>,
    pub columns: Vec<ColumnMeta>,
    pub data: Vec<ResolvedRow>,
    pub metadata: InstanceMetadata,
}

/// Column metadata within an instance: saved cells are editable too
pub(crate) fn instance_column_meta(column: &ColumnDeclaration) -> ColumnMeta {
    let mut meta = ColumnMeta::from(column);
    meta.editable = meta.editable || column.saved_per_instance;
    meta
}
