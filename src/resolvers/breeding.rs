//! Breeding record lookups

use std::sync::Arc;

use async_trait::async_trait;

use super::format::{opt_date, opt_text};
use super::{ResolutionContext, SourceResolver};
use crate::error::{CellError, CellResult};
use crate::sheets::column::Source;
use crate::store::RanchStore;

pub struct BreedingResolver {
    store: Arc<dyn RanchStore>,
}

impl BreedingResolver {
    pub fn new(store: Arc<dyn RanchStore>) -> Self {
        Self { store }
    }

    /// Whether any breeding record exists in the context's plan year
    pub async fn has_record(&self, row_key: &str, ctx: &ResolutionContext) -> CellResult<bool> {
        let records = self
            .store
            .breeding_records(row_key, ctx.breeding_year)
            .await?;
        Ok(!records.is_empty())
    }
}

#[async_trait]
impl SourceResolver for BreedingResolver {
    fn source(&self) -> Source {
        Source::BreedingRecords
    }

    async fn value(
        &self,
        row_key: &str,
        field: &str,
        ctx: &ResolutionContext,
    ) -> CellResult<String> {
        let records = self
            .store
            .breeding_records(row_key, ctx.breeding_year)
            .await?;

        if field == "CurrentBull" {
            let bull = records
                .iter()
                .find(|r| r.exposed_on(ctx.today))
                .and_then(|r| r.primary_bulls.clone());
            return Ok(bull.unwrap_or_else(|| "None".to_string()));
        }

        let latest = records.first();
        let value = match field {
            "PrimaryBulls" => opt_text(latest.and_then(|r| r.primary_bulls.as_ref())),
            "CleanupBulls" => opt_text(latest.and_then(|r| r.cleanup_bulls.as_ref())),
            "ExposureStartDate" => opt_date(latest.and_then(|r| r.exposure_start_date)),
            "ExposureEndDate" => opt_date(latest.and_then(|r| r.exposure_end_date)),
            _ => return Err(CellError::unknown("BreedingRecords", field)),
        };
        Ok(value)
    }
}
