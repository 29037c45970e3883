//! Weight lookups
//!
//! `CurrentWeight` and `LastWeightDate` follow the animal's last-weight
//! pointer. `Latest` and `LatestDate` take the newest record by time recorded.
//! The two can disagree when the pointer is stale.

use std::sync::Arc;

use async_trait::async_trait;

use super::format::{opt_date, opt_number};
use super::{ResolutionContext, SourceResolver};
use crate::error::{CellError, CellResult};
use crate::sheets::column::Source;
use crate::store::{RanchStore, WeightRecord};

pub struct WeightResolver {
    store: Arc<dyn RanchStore>,
}

impl WeightResolver {
    pub fn new(store: Arc<dyn RanchStore>) -> Self {
        Self { store }
    }
}

fn weight_of(record: Option<WeightRecord>) -> String {
    opt_number(record.and_then(|r| r.weight))
}

fn date_of(record: Option<WeightRecord>) -> String {
    opt_date(record.and_then(|r| r.time_recorded).map(|t| t.date()))
}

#[async_trait]
impl SourceResolver for WeightResolver {
    fn source(&self) -> Source {
        Source::WeightRecords
    }

    async fn value(
        &self,
        row_key: &str,
        field: &str,
        _ctx: &ResolutionContext,
    ) -> CellResult<String> {
        match field {
            "CurrentWeight" => Ok(weight_of(self.store.last_recorded_weight(row_key).await?)),
            "LastWeightDate" => Ok(date_of(self.store.last_recorded_weight(row_key).await?)),
            "Latest" | "Weight" => Ok(weight_of(self.store.latest_weight(row_key).await?)),
            "LatestDate" | "TimeRecorded" => {
                Ok(date_of(self.store.latest_weight(row_key).await?))
            }
            _ => Err(CellError::unknown("WeightRecords", field)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryRanchStore;
    use chrono::NaiveDate;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn resolver() -> WeightResolver {
        let store = InMemoryRanchStore::new()
            .with_weight(
                "101",
                1,
                WeightRecord {
                    weight: Some(880.0),
                    time_recorded: day(2024, 2, 1).and_hms_opt(9, 30, 0),
                },
            )
            .with_weight(
                "101",
                2,
                WeightRecord {
                    weight: Some(912.5),
                    time_recorded: day(2024, 5, 20).and_hms_opt(7, 0, 0),
                },
            )
            .with_last_weight_pointer("101", 1);
        WeightResolver::new(Arc::new(store))
    }

    fn ctx() -> ResolutionContext {
        ResolutionContext::new(day(2024, 6, 15))
    }

    #[tokio::test]
    async fn pointer_and_chronological_weights_can_disagree() {
        let resolver = resolver();
        assert_eq!(resolver.value("101", "CurrentWeight", &ctx()).await.unwrap(), "880");
        assert_eq!(
            resolver.value("101", "LastWeightDate", &ctx()).await.unwrap(),
            "02/01/2024"
        );
        assert_eq!(resolver.value("101", "Latest", &ctx()).await.unwrap(), "912.5");
        assert_eq!(resolver.value("101", "Weight", &ctx()).await.unwrap(), "912.5");
        assert_eq!(
            resolver.value("101", "LatestDate", &ctx()).await.unwrap(),
            "05/20/2024"
        );
    }

    #[tokio::test]
    async fn animal_without_weights_is_empty() {
        let resolver = resolver();
        assert_eq!(resolver.value("102", "CurrentWeight", &ctx()).await.unwrap(), "");
        assert_eq!(resolver.value("102", "Latest", &ctx()).await.unwrap(), "");
    }
}
