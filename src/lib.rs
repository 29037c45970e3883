//! Ranch sheet engine
//!
//! Operators define sheets as ordered lists of columns, each naming a data
//! path (`<Source>/<Field>`) instead of a query. Resolving a sheet produces a
//! table with one row per animal in scope and one cell per column.
//!
//! The engine reads ranch records through [`store::RanchStore`] and persists
//! sheet definitions through [`sheets::SheetStore`]. Both have in-memory
//! implementations; the `database` feature adds Postgres ones and the
//! `server` feature adds the HTTP API.

pub mod error;
pub mod resolvers;
pub mod sheets;
pub mod store;

#[cfg(feature = "database")]
pub mod database;

#[cfg(feature = "server")]
pub mod api;

pub use error::{CellError, SheetError};
pub use resolvers::ResolutionContext;
pub use sheets::{
    column_catalog, ColumnDeclaration, InMemorySheetStore, InstanceRequest, LoadedInstance,
    NewSheet, ResolveRequest, ResolvedTable, SheetAssembler, SheetDefinition, SheetInstance,
    SheetStore,
};
pub use store::{InMemoryRanchStore, RanchStore};
