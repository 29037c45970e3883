//! Per-source cell resolvers
//!
//! Each resolver maps a field name of its source to a read against the ranch
//! store and renders the result as a display string. A missing record is not
//! an error and renders empty (or `"None"` for the list-valued fields).
//! Errors are returned to the column router, which logs them and blanks the
//! cell.

use async_trait::async_trait;
use chrono::{Local, NaiveDate};

use crate::error::CellResult;
use crate::sheets::column::Source;

pub mod breeding;
pub mod calculated;
pub mod calving;
pub mod cow_table;
pub mod format;
pub mod herds;
pub mod medical;
pub mod pregnancy;
pub mod weight;

pub use breeding::BreedingResolver;
pub use calculated::CalculatedResolver;
pub use calving::CalvingResolver;
pub use cow_table::CowTableResolver;
pub use herds::HerdsResolver;
pub use medical::MedicalResolver;
pub use pregnancy::PregnancyResolver;
pub use weight::WeightResolver;

/// Values fixed for the duration of one sheet resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionContext {
    /// Calendar date every time-dependent calculation is measured against
    pub today: NaiveDate,
    /// Restricts breeding, pregnancy and calving lookups to one plan year
    pub breeding_year: Option<i32>,
}

impl ResolutionContext {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            breeding_year: None,
        }
    }

    /// Context dated with the local calendar date
    pub fn today() -> Self {
        Self::new(Local::now().date_naive())
    }

    pub fn with_breeding_year(mut self, breeding_year: Option<i32>) -> Self {
        self.breeding_year = breeding_year;
        self
    }
}

#[async_trait]
pub trait SourceResolver: Send + Sync {
    fn source(&self) -> Source;

    async fn value(
        &self,
        row_key: &str,
        field: &str,
        ctx: &ResolutionContext,
    ) -> CellResult<String>;
}
