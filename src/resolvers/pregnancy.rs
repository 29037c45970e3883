//! Latest pregnancy check lookups

use std::sync::Arc;

use async_trait::async_trait;

use super::format::{opt_date, opt_number, opt_text};
use super::{ResolutionContext, SourceResolver};
use crate::error::{CellError, CellResult};
use crate::sheets::column::Source;
use crate::store::RanchStore;

pub struct PregnancyResolver {
    store: Arc<dyn RanchStore>,
}

impl PregnancyResolver {
    pub fn new(store: Arc<dyn RanchStore>) -> Self {
        Self { store }
    }
}

fn yes_no(flag: Option<bool>) -> String {
    match flag {
        Some(true) => "Yes".to_string(),
        Some(false) => "No".to_string(),
        None => String::new(),
    }
}

#[async_trait]
impl SourceResolver for PregnancyResolver {
    fn source(&self) -> Source {
        Source::PregnancyCheck
    }

    async fn value(
        &self,
        row_key: &str,
        field: &str,
        ctx: &ResolutionContext,
    ) -> CellResult<String> {
        let check = self
            .store
            .latest_pregnancy_check(row_key, ctx.breeding_year)
            .await?;
        let check = check.as_ref();

        let value = match field {
            "IsPregnant" => yes_no(check.and_then(|c| c.is_pregnant)),
            "PregCheckDate" => opt_date(check.and_then(|c| c.preg_check_date)),
            "FetusSex" => opt_text(check.and_then(|c| c.fetus_sex.as_ref())),
            "WeightAtCheck" => opt_number(check.and_then(|c| c.weight_at_check)),
            "Notes" => opt_text(check.and_then(|c| c.notes.as_ref())),
            "MonthsPregnant" => check
                .and_then(|c| c.months_pregnant)
                .map(|m| m.to_string())
                .unwrap_or_default(),
            _ => return Err(CellError::unknown("PregnancyCheck", field)),
        };
        Ok(value)
    }
}
