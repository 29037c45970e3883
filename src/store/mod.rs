//! Data-access handle for the ranch records read by the sheet engine
//!
//! The engine never talks to a connection directly. Every resolver holds an
//! `Arc<dyn RanchStore>` that is built once at the process boundary, either
//! from a Postgres pool (`database` feature) or from in-memory fixtures.
//!
//! Methods that return a list return it in the order the resolvers expect
//! (most recent first for dated records, ascending tag order for row keys).

use anyhow::Result;
use async_trait::async_trait;

pub mod memory;
pub mod records;

pub use memory::InMemoryRanchStore;
pub use records::{
    BreedingRecord, CalvingRecord, CowRecord, IssueRecord, PregnancyCheckRecord, TreatmentRecord,
    WeightRecord,
};

#[async_trait]
pub trait RanchStore: Send + Sync {
    /// Animal row by tag
    async fn cow(&self, cow_tag: &str) -> Result<Option<CowRecord>>;

    /// Weight record referenced by the animal's "last recorded weight" pointer
    async fn last_recorded_weight(&self, cow_tag: &str) -> Result<Option<WeightRecord>>;

    /// Most recent weight record by time recorded
    async fn latest_weight(&self, cow_tag: &str) -> Result<Option<WeightRecord>>;

    /// All treatments with a medicine, most recent first
    async fn treatments(&self, cow_tag: &str) -> Result<Vec<TreatmentRecord>>;

    /// Treatments whose medicine is flagged as an immunization, most recent first
    async fn vaccinations(&self, cow_tag: &str) -> Result<Vec<TreatmentRecord>>;

    /// Open (unresolved) issues, most recently observed first
    async fn open_issues(&self, cow_tag: &str) -> Result<Vec<IssueRecord>>;

    /// Breeding records ordered by exposure start, most recent first
    async fn breeding_records(
        &self,
        cow_tag: &str,
        plan_year: Option<i32>,
    ) -> Result<Vec<BreedingRecord>>;

    async fn latest_pregnancy_check(
        &self,
        cow_tag: &str,
        plan_year: Option<i32>,
    ) -> Result<Option<PregnancyCheckRecord>>;

    /// Most recent calving where the animal is the dam
    async fn latest_calving(
        &self,
        dam_tag: &str,
        plan_year: Option<i32>,
    ) -> Result<Option<CalvingRecord>>;

    /// Pasture of the animal's current herd
    async fn current_pasture(&self, cow_tag: &str) -> Result<Option<String>>;

    async fn has_weaning_record(&self, cow_tag: &str) -> Result<bool>;

    /// Non-null tags assigned to a herd, ascending
    async fn herd_members(&self, herd_name: &str) -> Result<Vec<String>>;

    /// Non-null tags whose status is null or one of `statuses`, ascending
    async fn animals_with_status(&self, statuses: &[&str]) -> Result<Vec<String>>;
}
