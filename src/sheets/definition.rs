//! Persisted sheet definitions

use serde::{Deserialize, Serialize};

use super::column::ColumnDeclaration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetDefinition {
    pub id: i32,
    pub name: String,
    pub columns: Vec<ColumnDeclaration>,
    pub created_by: String,
    #[serde(default)]
    pub locked: bool,
}

/// Fields of a sheet before the store assigns an id
#[derive(Debug, Clone)]
pub struct NewSheet {
    pub name: String,
    pub columns: Vec<ColumnDeclaration>,
    pub created_by: String,
    pub locked: bool,
}

impl NewSheet {
    pub fn new(
        name: impl Into<String>,
        columns: Vec<ColumnDeclaration>,
        created_by: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            columns,
            created_by: created_by.into(),
            locked: false,
        }
    }

    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }
}

/// Listing entry for a sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetSummary {
    pub id: i32,
    pub name: String,
    pub created_by: String,
    pub locked: bool,
}

impl From<&SheetDefinition> for SheetSummary {
    fn from(sheet: &SheetDefinition) -> Self {
        Self {
            id: sheet.id,
            name: sheet.name.clone(),
            created_by: sheet.created_by.clone(),
            locked: sheet.locked,
        }
    }
}
