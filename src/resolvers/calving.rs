//! Most recent calving where the row is the dam

use std::sync::Arc;

use async_trait::async_trait;

use super::format::{opt_date, opt_text};
use super::{ResolutionContext, SourceResolver};
use crate::error::{CellError, CellResult};
use crate::sheets::column::Source;
use crate::store::RanchStore;

pub struct CalvingResolver {
    store: Arc<dyn RanchStore>,
}

impl CalvingResolver {
    pub fn new(store: Arc<dyn RanchStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SourceResolver for CalvingResolver {
    fn source(&self) -> Source {
        Source::CalvingRecords
    }

    async fn value(
        &self,
        row_key: &str,
        field: &str,
        ctx: &ResolutionContext,
    ) -> CellResult<String> {
        let calving = self
            .store
            .latest_calving(row_key, ctx.breeding_year)
            .await?;
        let calving = calving.as_ref();

        let value = match field {
            "CalfTag" => opt_text(calving.and_then(|c| c.calf_tag.as_ref())),
            "CalfSex" => opt_text(calving.and_then(|c| c.calf_sex.as_ref())),
            "BirthDate" => opt_date(calving.and_then(|c| c.birth_date)),
            "CalvingNotes" => opt_text(calving.and_then(|c| c.calving_notes.as_ref())),
            _ => return Err(CellError::unknown("CalvingRecords", field)),
        };
        Ok(value)
    }
}
