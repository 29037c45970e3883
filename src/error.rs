//! Error types for the sheet engine
//!
//! `SheetError` is surfaced to callers of the sheet store and the table
//! assembler. `CellError` never leaves the column router: it is logged and
//! replaced by an empty cell.

use thiserror::Error;

/// Errors surfaced by sheet persistence and sheet resolution
#[derive(Error, Debug)]
pub enum SheetError {
    #[error("Sheet {0} not found")]
    NotFound(i32),

    #[error("Sheet {0} is locked")]
    Locked(i32),

    #[error("Invalid sheet definition: {0}")]
    InvalidDefinition(String),

    #[error("Sheet instance {0} not found")]
    InstanceNotFound(i32),

    #[error("Invalid cell update: {0}")]
    InvalidCellUpdate(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(#[from] anyhow::Error),
}

impl SheetError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            SheetError::NotFound(_) | SheetError::InstanceNotFound(_)
        )
    }
}

/// Errors raised while resolving a single cell
#[derive(Error, Debug)]
pub enum CellError {
    #[error("Unknown field '{field}' for source '{source_name}'")]
    UnknownField {
        source_name: &'static str,
        field: String,
    },

    #[error("Store error: {0}")]
    Store(#[from] anyhow::Error),
}

impl CellError {
    pub(crate) fn unknown(source_name: &'static str, field: &str) -> Self {
        CellError::UnknownField {
            source_name,
            field: field.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SheetError>;

pub type CellResult<T> = std::result::Result<T, CellError>;
