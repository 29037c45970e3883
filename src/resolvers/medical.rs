//! Treatment and issue lists
//!
//! Every field renders a comma-joined `"name (date)"` list, most recent
//! first, or `"None"` when nothing matches.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;

use super::format::dated_list;
use super::{ResolutionContext, SourceResolver};
use crate::error::{CellError, CellResult};
use crate::sheets::column::Source;
use crate::store::{RanchStore, TreatmentRecord};

pub struct MedicalResolver {
    store: Arc<dyn RanchStore>,
}

impl MedicalResolver {
    pub fn new(store: Arc<dyn RanchStore>) -> Self {
        Self { store }
    }
}

fn treatment_list(treatments: &[TreatmentRecord]) -> String {
    dated_list(
        treatments
            .iter()
            .map(|t| (t.medicine.as_str(), t.treatment_date)),
    )
}

/// Keeps the first (most recent) entry of each medicine
fn unique_by_medicine(treatments: Vec<TreatmentRecord>) -> Vec<TreatmentRecord> {
    let mut seen = HashSet::new();
    treatments
        .into_iter()
        .filter(|t| seen.insert(t.medicine.clone()))
        .collect()
}

#[async_trait]
impl SourceResolver for MedicalResolver {
    fn source(&self) -> Source {
        Source::MedicalTable
    }

    async fn value(
        &self,
        row_key: &str,
        field: &str,
        _ctx: &ResolutionContext,
    ) -> CellResult<String> {
        match field {
            "Vaccinations" => Ok(treatment_list(&self.store.vaccinations(row_key).await?)),
            "AllTreatments" => Ok(treatment_list(&self.store.treatments(row_key).await?)),
            "UniqueTreatments" => {
                let treatments = unique_by_medicine(self.store.treatments(row_key).await?);
                Ok(treatment_list(&treatments))
            }
            "RecentIssues" => {
                let issues = self.store.open_issues(row_key).await?;
                Ok(dated_list(
                    issues
                        .iter()
                        .map(|i| (i.description.as_str(), i.observed_on)),
                ))
            }
            _ => Err(CellError::unknown("MedicalTable", field)),
        }
    }
}
