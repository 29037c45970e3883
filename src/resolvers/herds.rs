//! Herd lookups through the animal's current herd

use std::sync::Arc;

use async_trait::async_trait;

use super::{ResolutionContext, SourceResolver};
use crate::error::{CellError, CellResult};
use crate::sheets::column::Source;
use crate::store::RanchStore;

pub struct HerdsResolver {
    store: Arc<dyn RanchStore>,
}

impl HerdsResolver {
    pub fn new(store: Arc<dyn RanchStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SourceResolver for HerdsResolver {
    fn source(&self) -> Source {
        Source::Herds
    }

    async fn value(
        &self,
        row_key: &str,
        field: &str,
        _ctx: &ResolutionContext,
    ) -> CellResult<String> {
        match field {
            "CurrentPasture" => Ok(self
                .store
                .current_pasture(row_key)
                .await?
                .unwrap_or_default()),
            _ => Err(CellError::unknown("Herds", field)),
        }
    }
}
