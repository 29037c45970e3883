//! Sheet definitions and sheet resolution
//!
//! A sheet is a named, ordered list of column declarations. Resolving it
//! produces one row per animal in scope with one cell per declared column.
//! An instance of a sheet fixes its row set and keeps captured values for the
//! columns saved per instance.

pub mod assembler;
pub mod catalog;
pub mod column;
pub mod definition;
pub mod instance;
pub mod router;
pub mod row_set;
pub mod store;

pub use assembler::{ColumnMeta, ResolveRequest, ResolvedRow, ResolvedTable, SheetAssembler};
pub use catalog::{column_catalog, CatalogEntry, CatalogGroup};
pub use column::{
    compose_columns, validate_definition, ColumnDeclaration, DataPath, SheetColumns, Source,
    FILLABLE_PREFIX, ROW_KEY_COLUMN,
};
pub use definition::{NewSheet, SheetDefinition, SheetSummary};
pub use instance::{
    CapturedCell, CellUpdate, InstanceCells, InstanceMetadata, InstanceRequest, InstanceSummary,
    LoadedInstance, NewSheetInstance, SheetInstance, COPY_INSTANCE_SOURCE,
};
pub use router::ColumnRouter;
pub use row_set::{RowSetSelector, ACTIVE_STATUSES, ALL_ACTIVE};
pub use store::{InMemorySheetStore, SheetStore};
