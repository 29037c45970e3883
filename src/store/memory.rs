//! In-memory ranch store for tests and offline demos

use std::collections::{BTreeMap, HashMap, HashSet};

use anyhow::Result;
use async_trait::async_trait;

use super::records::*;
use super::RanchStore;

/// Ranch records held in memory, assembled with the `with_*` builders
#[derive(Debug, Default, Clone)]
pub struct InMemoryRanchStore {
    cows: BTreeMap<String, CowRecord>,
    weights: Vec<(String, u32, WeightRecord)>,
    weight_pointers: HashMap<String, u32>,
    treatments: Vec<(String, TreatmentRecord)>,
    immunizations: HashSet<String>,
    issues: Vec<(String, IssueRecord, bool)>,
    breeding: Vec<(String, Option<i32>, BreedingRecord)>,
    pregnancy_checks: Vec<(String, Option<i32>, PregnancyCheckRecord)>,
    calvings: Vec<(String, Option<i32>, CalvingRecord)>,
    pastures: HashMap<String, String>,
    weaned: HashSet<String>,
}

impl InMemoryRanchStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cow(mut self, cow: CowRecord) -> Self {
        self.cows.insert(cow.cow_tag.clone(), cow);
        self
    }

    /// Adds a weight record; `id` is what the last-weight pointer refers to
    pub fn with_weight(mut self, cow_tag: &str, id: u32, record: WeightRecord) -> Self {
        self.weights.push((cow_tag.to_string(), id, record));
        self
    }

    pub fn with_last_weight_pointer(mut self, cow_tag: &str, weight_id: u32) -> Self {
        self.weight_pointers.insert(cow_tag.to_string(), weight_id);
        self
    }

    pub fn with_treatment(mut self, cow_tag: &str, record: TreatmentRecord) -> Self {
        self.treatments.push((cow_tag.to_string(), record));
        self
    }

    pub fn with_immunization(mut self, medicine: &str) -> Self {
        self.immunizations.insert(medicine.to_string());
        self
    }

    pub fn with_issue(mut self, cow_tag: &str, record: IssueRecord, resolved: bool) -> Self {
        self.issues.push((cow_tag.to_string(), record, resolved));
        self
    }

    pub fn with_breeding(
        mut self,
        cow_tag: &str,
        plan_year: Option<i32>,
        record: BreedingRecord,
    ) -> Self {
        self.breeding.push((cow_tag.to_string(), plan_year, record));
        self
    }

    pub fn with_pregnancy_check(
        mut self,
        cow_tag: &str,
        plan_year: Option<i32>,
        record: PregnancyCheckRecord,
    ) -> Self {
        self.pregnancy_checks
            .push((cow_tag.to_string(), plan_year, record));
        self
    }

    pub fn with_calving(
        mut self,
        dam_tag: &str,
        plan_year: Option<i32>,
        record: CalvingRecord,
    ) -> Self {
        self.calvings.push((dam_tag.to_string(), plan_year, record));
        self
    }

    pub fn with_herd(mut self, herd_name: &str, pasture: &str) -> Self {
        self.pastures
            .insert(herd_name.to_string(), pasture.to_string());
        self
    }

    pub fn with_weaning(mut self, cow_tag: &str) -> Self {
        self.weaned.insert(cow_tag.to_string());
        self
    }

    fn tagged_cows(&self) -> impl Iterator<Item = &CowRecord> {
        self.cows.values().filter(|c| !c.cow_tag.is_empty())
    }
}

fn in_plan(record_year: Option<i32>, plan_year: Option<i32>) -> bool {
    plan_year.map_or(true, |year| record_year == Some(year))
}

#[async_trait]
impl RanchStore for InMemoryRanchStore {
    async fn cow(&self, cow_tag: &str) -> Result<Option<CowRecord>> {
        Ok(self.cows.get(cow_tag).cloned())
    }

    async fn last_recorded_weight(&self, cow_tag: &str) -> Result<Option<WeightRecord>> {
        let Some(pointer) = self.weight_pointers.get(cow_tag) else {
            return Ok(None);
        };
        Ok(self
            .weights
            .iter()
            .find(|(_, id, _)| id == pointer)
            .map(|(_, _, record)| record.clone()))
    }

    async fn latest_weight(&self, cow_tag: &str) -> Result<Option<WeightRecord>> {
        Ok(self
            .weights
            .iter()
            .filter(|(tag, _, _)| tag == cow_tag)
            .max_by_key(|(_, _, record)| record.time_recorded)
            .map(|(_, _, record)| record.clone()))
    }

    async fn treatments(&self, cow_tag: &str) -> Result<Vec<TreatmentRecord>> {
        let mut found: Vec<TreatmentRecord> = self
            .treatments
            .iter()
            .filter(|(tag, _)| tag == cow_tag)
            .map(|(_, record)| record.clone())
            .collect();
        found.sort_by(|a, b| b.treatment_date.cmp(&a.treatment_date));
        Ok(found)
    }

    async fn vaccinations(&self, cow_tag: &str) -> Result<Vec<TreatmentRecord>> {
        let mut found = self.treatments(cow_tag).await?;
        found.retain(|t| self.immunizations.contains(&t.medicine));
        Ok(found)
    }

    async fn open_issues(&self, cow_tag: &str) -> Result<Vec<IssueRecord>> {
        let mut found: Vec<IssueRecord> = self
            .issues
            .iter()
            .filter(|(tag, _, resolved)| tag == cow_tag && !resolved)
            .map(|(_, record, _)| record.clone())
            .collect();
        found.sort_by(|a, b| b.observed_on.cmp(&a.observed_on));
        Ok(found)
    }

    async fn breeding_records(
        &self,
        cow_tag: &str,
        plan_year: Option<i32>,
    ) -> Result<Vec<BreedingRecord>> {
        let mut found: Vec<BreedingRecord> = self
            .breeding
            .iter()
            .filter(|(tag, year, _)| tag == cow_tag && in_plan(*year, plan_year))
            .map(|(_, _, record)| record.clone())
            .collect();
        found.sort_by(|a, b| b.exposure_start_date.cmp(&a.exposure_start_date));
        Ok(found)
    }

    async fn latest_pregnancy_check(
        &self,
        cow_tag: &str,
        plan_year: Option<i32>,
    ) -> Result<Option<PregnancyCheckRecord>> {
        Ok(self
            .pregnancy_checks
            .iter()
            .filter(|(tag, year, _)| tag == cow_tag && in_plan(*year, plan_year))
            .max_by_key(|(_, _, record)| record.preg_check_date)
            .map(|(_, _, record)| record.clone()))
    }

    async fn latest_calving(
        &self,
        dam_tag: &str,
        plan_year: Option<i32>,
    ) -> Result<Option<CalvingRecord>> {
        Ok(self
            .calvings
            .iter()
            .filter(|(tag, year, _)| tag == dam_tag && in_plan(*year, plan_year))
            .max_by_key(|(_, _, record)| record.birth_date)
            .map(|(_, _, record)| record.clone()))
    }

    async fn current_pasture(&self, cow_tag: &str) -> Result<Option<String>> {
        Ok(self
            .cows
            .get(cow_tag)
            .and_then(|cow| cow.current_herd.as_ref())
            .and_then(|herd| self.pastures.get(herd))
            .cloned())
    }

    async fn has_weaning_record(&self, cow_tag: &str) -> Result<bool> {
        Ok(self.weaned.contains(cow_tag))
    }

    async fn herd_members(&self, herd_name: &str) -> Result<Vec<String>> {
        Ok(self
            .tagged_cows()
            .filter(|c| c.current_herd.as_deref() == Some(herd_name))
            .map(|c| c.cow_tag.clone())
            .collect())
    }

    async fn animals_with_status(&self, statuses: &[&str]) -> Result<Vec<String>> {
        Ok(self
            .tagged_cows()
            .filter(|c| match c.status.as_deref() {
                None => true,
                Some(status) => statuses.contains(&status),
            })
            .map(|c| c.cow_tag.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn latest_weight_ignores_pointer() {
        let store = InMemoryRanchStore::new()
            .with_weight(
                "101",
                1,
                WeightRecord {
                    weight: Some(900.0),
                    time_recorded: day(2024, 1, 1).and_hms_opt(8, 0, 0),
                },
            )
            .with_weight(
                "101",
                2,
                WeightRecord {
                    weight: Some(950.0),
                    time_recorded: day(2024, 6, 1).and_hms_opt(8, 0, 0),
                },
            )
            .with_last_weight_pointer("101", 1);

        let latest = store.latest_weight("101").await.unwrap().unwrap();
        let pointed = store.last_recorded_weight("101").await.unwrap().unwrap();
        assert_eq!(latest.weight, Some(950.0));
        assert_eq!(pointed.weight, Some(900.0));
    }

    #[tokio::test]
    async fn breeding_records_respect_plan_year() {
        let store = InMemoryRanchStore::new()
            .with_breeding(
                "7",
                Some(2023),
                BreedingRecord {
                    primary_bulls: Some("Old Bull".into()),
                    exposure_start_date: Some(day(2023, 5, 1)),
                    ..Default::default()
                },
            )
            .with_breeding(
                "7",
                Some(2024),
                BreedingRecord {
                    primary_bulls: Some("New Bull".into()),
                    exposure_start_date: Some(day(2024, 5, 1)),
                    ..Default::default()
                },
            );

        let all = store.breeding_records("7", None).await.unwrap();
        assert_eq!(all[0].primary_bulls.as_deref(), Some("New Bull"));

        let scoped = store.breeding_records("7", Some(2023)).await.unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].primary_bulls.as_deref(), Some("Old Bull"));
    }
}
