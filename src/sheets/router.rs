//! Column router
//!
//! Parses a data path, dispatches to the resolver for its source and turns
//! every failure into an empty cell. Nothing below this point can fail a
//! sheet resolution.

use std::sync::Arc;

use tracing::{debug, warn};

use super::column::{DataPath, Source};
use crate::resolvers::{
    BreedingResolver, CalculatedResolver, CalvingResolver, CowTableResolver, HerdsResolver,
    MedicalResolver, PregnancyResolver, ResolutionContext, SourceResolver, WeightResolver,
};
use crate::store::RanchStore;

pub struct ColumnRouter {
    cow_table: CowTableResolver,
    weight: WeightResolver,
    medical: MedicalResolver,
    breeding: BreedingResolver,
    pregnancy: PregnancyResolver,
    calving: CalvingResolver,
    herds: HerdsResolver,
    calculated: CalculatedResolver,
}

impl ColumnRouter {
    pub fn new(store: Arc<dyn RanchStore>) -> Self {
        Self {
            cow_table: CowTableResolver::new(store.clone()),
            weight: WeightResolver::new(store.clone()),
            medical: MedicalResolver::new(store.clone()),
            breeding: BreedingResolver::new(store.clone()),
            pregnancy: PregnancyResolver::new(store.clone()),
            calving: CalvingResolver::new(store.clone()),
            herds: HerdsResolver::new(store.clone()),
            calculated: CalculatedResolver::new(store),
        }
    }

    fn resolver_for(&self, source: Source) -> Option<&dyn SourceResolver> {
        let resolver: &dyn SourceResolver = match source {
            Source::CowTable => &self.cow_table,
            Source::WeightRecords => &self.weight,
            Source::MedicalTable => &self.medical,
            Source::BreedingRecords => &self.breeding,
            Source::PregnancyCheck => &self.pregnancy,
            Source::CalvingRecords => &self.calving,
            Source::Herds => &self.herds,
            Source::Calculated => &self.calculated,
            // Fillable columns are entered by hand
            Source::Fillable => return None,
        };
        Some(resolver)
    }

    /// Resolves one cell. Never fails: unknown sources, fillable columns and
    /// resolver errors all yield an empty string.
    pub async fn resolve_cell(
        &self,
        row_key: &str,
        data_path: &str,
        ctx: &ResolutionContext,
    ) -> String {
        let path = DataPath::parse(data_path);
        let Some(source) = path.source else {
            debug!("Unknown source '{}' in {}", path.source_name, data_path);
            return String::new();
        };
        let Some(resolver) = self.resolver_for(source) else {
            return String::new();
        };

        match resolver.value(row_key, path.field, ctx).await {
            Ok(value) => value,
            Err(e) => {
                warn!(
                    row_key = %row_key,
                    data_path = %data_path,
                    "Cell resolution failed: {}",
                    e
                );
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{CowRecord, InMemoryRanchStore};
    use anyhow::anyhow;
    use async_trait::async_trait;
    use chrono::NaiveDate;

    fn ctx() -> ResolutionContext {
        ResolutionContext::new(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap())
    }

    fn router() -> ColumnRouter {
        let mut cow = CowRecord::new("101");
        cow.mother_tag = Some("55".into());
        ColumnRouter::new(Arc::new(InMemoryRanchStore::new().with_cow(cow)))
    }

    #[tokio::test]
    async fn dispatches_by_source() {
        assert_eq!(router().resolve_cell("101", "CowTable/Dam", &ctx()).await, "55");
    }

    #[tokio::test]
    async fn unknown_source_and_field_are_empty() {
        let router = router();
        assert_eq!(router.resolve_cell("101", "GoatTable/Dam", &ctx()).await, "");
        assert_eq!(router.resolve_cell("101", "CowTable/Horns", &ctx()).await, "");
        assert_eq!(router.resolve_cell("101", "nonsense", &ctx()).await, "");
    }

    #[tokio::test]
    async fn fillable_is_always_blank() {
        assert_eq!(router().resolve_cell("101", "Fillable/Notes", &ctx()).await, "");
    }

    /// Store whose every read fails
    struct BrokenStore;

    #[async_trait]
    impl RanchStore for BrokenStore {
        async fn cow(&self, _: &str) -> anyhow::Result<Option<CowRecord>> {
            Err(anyhow!("connection reset"))
        }
        async fn last_recorded_weight(
            &self,
            _: &str,
        ) -> anyhow::Result<Option<crate::store::WeightRecord>> {
            Err(anyhow!("connection reset"))
        }
        async fn latest_weight(&self, _: &str) -> anyhow::Result<Option<crate::store::WeightRecord>> {
            Err(anyhow!("connection reset"))
        }
        async fn treatments(&self, _: &str) -> anyhow::Result<Vec<crate::store::TreatmentRecord>> {
            Err(anyhow!("connection reset"))
        }
        async fn vaccinations(
            &self,
            _: &str,
        ) -> anyhow::Result<Vec<crate::store::TreatmentRecord>> {
            Err(anyhow!("connection reset"))
        }
        async fn open_issues(&self, _: &str) -> anyhow::Result<Vec<crate::store::IssueRecord>> {
            Err(anyhow!("connection reset"))
        }
        async fn breeding_records(
            &self,
            _: &str,
            _: Option<i32>,
        ) -> anyhow::Result<Vec<crate::store::BreedingRecord>> {
            Err(anyhow!("connection reset"))
        }
        async fn latest_pregnancy_check(
            &self,
            _: &str,
            _: Option<i32>,
        ) -> anyhow::Result<Option<crate::store::PregnancyCheckRecord>> {
            Err(anyhow!("connection reset"))
        }
        async fn latest_calving(
            &self,
            _: &str,
            _: Option<i32>,
        ) -> anyhow::Result<Option<crate::store::CalvingRecord>> {
            Err(anyhow!("connection reset"))
        }
        async fn current_pasture(&self, _: &str) -> anyhow::Result<Option<String>> {
            Err(anyhow!("connection reset"))
        }
        async fn has_weaning_record(&self, _: &str) -> anyhow::Result<bool> {
            Err(anyhow!("connection reset"))
        }
        async fn herd_members(&self, _: &str) -> anyhow::Result<Vec<String>> {
            Err(anyhow!("connection reset"))
        }
        async fn animals_with_status(&self, _: &[&str]) -> anyhow::Result<Vec<String>> {
            Err(anyhow!("connection reset"))
        }
    }

    #[tokio::test]
    async fn store_failures_degrade_to_empty() {
        let router = ColumnRouter::new(Arc::new(BrokenStore));
        for path in [
            "CowTable/Dam",
            "WeightRecords/Latest",
            "MedicalTable/AllTreatments",
            "BreedingRecords/CurrentBull",
            "PregnancyCheck/IsPregnant",
            "CalvingRecords/CalfTag",
            "Herds/CurrentPasture",
            "Calculated/Age",
        ] {
            assert_eq!(router.resolve_cell("101", path, &ctx()).await, "", "{}", path);
        }
    }
}
