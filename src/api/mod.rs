//! REST API module for sheet operations

#[cfg(feature = "server")]
pub mod sheet_routes;

#[cfg(feature = "server")]
pub use sheet_routes::{create_sheet_router, SheetState};
