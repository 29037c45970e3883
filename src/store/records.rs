//! Typed records returned by the ranch store

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[cfg(feature = "database")]
use sqlx::FromRow;

/// One row of the animal table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(FromRow))]
pub struct CowRecord {
    pub cow_tag: String,
    /// Stored as "Dam (Mother)"
    pub mother_tag: Option<String>,
    /// Stored as "Sire (Father)"
    pub father_tag: Option<String>,
    pub sex: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub current_herd: Option<String>,
    pub description: Option<String>,
    pub breed: Option<String>,
    pub temperament: Option<String>,
    pub status: Option<String>,
    pub reg_cert: Option<String>,
    pub weaning_weight: Option<f64>,
    pub weaning_date: Option<NaiveDate>,
    pub animal_class: Option<String>,
}

impl CowRecord {
    pub fn new(cow_tag: impl Into<String>) -> Self {
        Self {
            cow_tag: cow_tag.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(FromRow))]
pub struct WeightRecord {
    pub weight: Option<f64>,
    pub time_recorded: Option<NaiveDateTime>,
}

/// A treatment entry (medicine name plus treatment date)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(FromRow))]
pub struct TreatmentRecord {
    pub medicine: String,
    pub treatment_date: Option<NaiveDate>,
}

/// An unresolved medical issue
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(FromRow))]
pub struct IssueRecord {
    pub description: String,
    pub observed_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(FromRow))]
pub struct BreedingRecord {
    pub primary_bulls: Option<String>,
    pub cleanup_bulls: Option<String>,
    pub exposure_start_date: Option<NaiveDate>,
    pub exposure_end_date: Option<NaiveDate>,
}

impl BreedingRecord {
    /// Whether the exposure window (inclusive on both ends) contains `day`
    pub fn exposed_on(&self, day: NaiveDate) -> bool {
        match (self.exposure_start_date, self.exposure_end_date) {
            (Some(start), Some(end)) => start <= day && day <= end,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(FromRow))]
pub struct PregnancyCheckRecord {
    pub is_pregnant: Option<bool>,
    pub preg_check_date: Option<NaiveDate>,
    pub fetus_sex: Option<String>,
    /// Weight of the linked weight record
    pub weight_at_check: Option<f64>,
    pub notes: Option<String>,
    pub months_pregnant: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(FromRow))]
pub struct CalvingRecord {
    pub calf_tag: Option<String>,
    pub calf_sex: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub calving_notes: Option<String>,
}
