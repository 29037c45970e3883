//! Derived fields
//!
//! Calculations read their inputs through the leaf resolvers, so they see the
//! same rendered strings a sheet column would. A failing leaf lookup is
//! logged and treated as an empty input.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, Months, NaiveDate};
use tracing::warn;

use super::format::{display_date, parse_display_date};
use super::{
    BreedingResolver, CowTableResolver, PregnancyResolver, ResolutionContext, SourceResolver,
};
use crate::error::{CellError, CellResult};
use crate::sheets::column::Source;
use crate::store::RanchStore;

/// Average month length used by every month-granular calculation
pub const DAYS_PER_MONTH: f64 = 30.44;

const GESTATION_MONTHS: i32 = 9;

/// Whole years from `dob` to `today`
pub fn age_on(dob: NaiveDate, today: NaiveDate) -> i32 {
    let mut years = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        years -= 1;
    }
    years
}

fn whole_months(from: NaiveDate, today: NaiveDate) -> i64 {
    let days = (today - from).num_days();
    (days as f64 / DAYS_PER_MONTH).floor() as i64
}

/// Age in average-length months, zero for a birth date in the future
pub fn age_in_months(dob: NaiveDate, today: NaiveDate) -> i64 {
    whole_months(dob, today).max(0)
}

/// Months since a positive pregnancy check. Anything negative or beyond a
/// year is treated as stale and reported as zero.
pub fn pregnancy_months(check_date: NaiveDate, today: NaiveDate) -> i64 {
    let months = whole_months(check_date, today);
    if !(0..=12).contains(&months) {
        0
    } else {
        months
    }
}

/// Due date from a check that recorded months pregnant
pub fn due_from_check(check_date: NaiveDate, months_pregnant: i32) -> Option<NaiveDate> {
    let remaining = GESTATION_MONTHS - months_pregnant;
    if remaining >= 0 {
        check_date.checked_add_months(Months::new(remaining as u32))
    } else {
        check_date.checked_sub_months(Months::new(remaining.unsigned_abs()))
    }
}

/// Due date from the start of exposure
pub fn due_from_exposure(exposure_start: NaiveDate) -> Option<NaiveDate> {
    exposure_start.checked_add_months(Months::new(GESTATION_MONTHS as u32))
}

pub struct CalculatedResolver {
    cow_table: CowTableResolver,
    pregnancy: PregnancyResolver,
    breeding: BreedingResolver,
}

impl CalculatedResolver {
    pub fn new(store: Arc<dyn RanchStore>) -> Self {
        Self {
            cow_table: CowTableResolver::new(store.clone()),
            pregnancy: PregnancyResolver::new(store.clone()),
            breeding: BreedingResolver::new(store),
        }
    }

    async fn is_pregnant(&self, row_key: &str, ctx: &ResolutionContext) -> bool {
        leaf(&self.pregnancy, row_key, "IsPregnant", ctx).await == "Yes"
    }

    async fn age(&self, row_key: &str, ctx: &ResolutionContext) -> String {
        let dob = leaf(&self.cow_table, row_key, "DateOfBirth", ctx).await;
        parse_display_date(&dob)
            .map(|dob| age_on(dob, ctx.today).to_string())
            .unwrap_or_default()
    }

    async fn age_in_months(&self, row_key: &str, ctx: &ResolutionContext) -> String {
        let dob = leaf(&self.cow_table, row_key, "DateOfBirth", ctx).await;
        parse_display_date(&dob)
            .map(|dob| age_in_months(dob, ctx.today).to_string())
            .unwrap_or_default()
    }

    async fn pregnancy_months(&self, row_key: &str, ctx: &ResolutionContext) -> String {
        if !self.is_pregnant(row_key, ctx).await {
            return String::new();
        }
        let checked = leaf(&self.pregnancy, row_key, "PregCheckDate", ctx).await;
        parse_display_date(&checked)
            .map(|date| pregnancy_months(date, ctx.today).to_string())
            .unwrap_or_default()
    }

    async fn breeding_status(&self, row_key: &str, ctx: &ResolutionContext) -> String {
        match leaf(&self.pregnancy, row_key, "IsPregnant", ctx).await.as_str() {
            "Yes" => return "Pregnant".to_string(),
            "No" => return "Open".to_string(),
            _ => {}
        }
        match self.breeding.has_record(row_key, ctx).await {
            Ok(true) => "Exposed".to_string(),
            Ok(false) => "Unknown".to_string(),
            Err(e) => {
                warn!("Breeding lookup failed for {}: {}", row_key, e);
                "Unknown".to_string()
            }
        }
    }

    async fn weaning_status(&self, row_key: &str) -> String {
        let weaned = self.cow_table.is_weaned(row_key).await.unwrap_or_else(|e| {
            warn!("Weaning lookup failed for {}: {}", row_key, e);
            false
        });
        let status = if weaned { "Weaned" } else { "Unweaned" };
        status.to_string()
    }

    async fn expected_delivery(&self, row_key: &str, ctx: &ResolutionContext) -> String {
        if !self.is_pregnant(row_key, ctx).await {
            return String::new();
        }

        let months = leaf(&self.pregnancy, row_key, "MonthsPregnant", ctx).await;
        let checked = leaf(&self.pregnancy, row_key, "PregCheckDate", ctx).await;
        let from_check = match (months.parse::<i32>(), parse_display_date(&checked)) {
            (Ok(months), Some(date)) if months > 0 => due_from_check(date, months),
            _ => None,
        };

        let due = match from_check {
            Some(due) => Some(due),
            None => {
                let start = leaf(&self.breeding, row_key, "ExposureStartDate", ctx).await;
                parse_display_date(&start).and_then(due_from_exposure)
            }
        };
        due.map(display_date).unwrap_or_default()
    }
}

fn yes_no(flag: bool) -> String {
    let text = if flag { "Yes" } else { "No" };
    text.to_string()
}

/// Leaf value with failures logged and blanked
async fn leaf<R: SourceResolver>(
    resolver: &R,
    row_key: &str,
    field: &str,
    ctx: &ResolutionContext,
) -> String {
    match resolver.value(row_key, field, ctx).await {
        Ok(value) => value,
        Err(e) => {
            warn!(
                "Leaf lookup {}/{} failed for {}: {}",
                resolver.source(),
                field,
                row_key,
                e
            );
            String::new()
        }
    }
}

#[async_trait]
impl SourceResolver for CalculatedResolver {
    fn source(&self) -> Source {
        Source::Calculated
    }

    async fn value(
        &self,
        row_key: &str,
        field: &str,
        ctx: &ResolutionContext,
    ) -> CellResult<String> {
        let value = match field {
            "Age" => self.age(row_key, ctx).await,
            "AgeInMonths" => self.age_in_months(row_key, ctx).await,
            "PregnancyMonths" => self.pregnancy_months(row_key, ctx).await,
            "OpenStatus" => {
                let open = !self.is_pregnant(row_key, ctx).await;
                yes_no(open)
            }
            "CullStatus" => {
                let status = leaf(&self.cow_table, row_key, "Status", ctx).await;
                yes_no(status == "Cull")
            }
            "BreedingStatus" => self.breeding_status(row_key, ctx).await,
            "WeaningStatus" => self.weaning_status(row_key).await,
            "ExpectedDeliveryDate" => self.expected_delivery(row_key, ctx).await,
            _ => return Err(CellError::unknown("Calculated", field)),
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{BreedingRecord, CowRecord, InMemoryRanchStore, PregnancyCheckRecord};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        day(2024, 6, 15)
    }

    #[test]
    fn age_turns_over_on_birthday() {
        assert_eq!(age_on(day(2020, 6, 14), today()), 4);
        assert_eq!(age_on(day(2020, 6, 15), today()), 4);
        assert_eq!(age_on(day(2020, 6, 16), today()), 3);
    }

    #[test]
    fn pregnancy_months_clamps_stale_checks() {
        assert_eq!(pregnancy_months(day(2024, 5, 15), today()), 1);
        assert_eq!(pregnancy_months(day(2023, 5, 15), today()), 0);
        assert_eq!(pregnancy_months(day(2024, 7, 15), today()), 0);
        // 366 days is exactly 12 average months
        assert_eq!(pregnancy_months(day(2023, 6, 15), today()), 12);
    }

    #[test]
    fn due_dates() {
        assert_eq!(due_from_check(day(2024, 1, 31), 3), Some(day(2024, 7, 31)));
        assert_eq!(due_from_check(day(2024, 8, 10), 10), Some(day(2024, 7, 10)));
        assert_eq!(due_from_exposure(day(2024, 5, 1)), Some(day(2025, 2, 1)));
    }

    fn resolver() -> CalculatedResolver {
        let mut bessie = CowRecord::new("101");
        bessie.date_of_birth = Some(day(2020, 6, 14));
        bessie.status = Some("Cull".into());

        let mut daisy = CowRecord::new("102");
        daisy.status = Some("Current".into());

        let store = InMemoryRanchStore::new()
            .with_cow(bessie)
            .with_cow(daisy)
            .with_pregnancy_check(
                "101",
                None,
                PregnancyCheckRecord {
                    is_pregnant: Some(true),
                    preg_check_date: Some(day(2024, 5, 15)),
                    months_pregnant: Some(2),
                    ..Default::default()
                },
            )
            .with_breeding(
                "102",
                None,
                BreedingRecord {
                    primary_bulls: Some("Rex".into()),
                    exposure_start_date: Some(day(2024, 5, 1)),
                    ..Default::default()
                },
            )
            .with_weaning("102");
        CalculatedResolver::new(Arc::new(store))
    }

    async fn calc(resolver: &CalculatedResolver, tag: &str, field: &str) -> String {
        resolver
            .value(tag, field, &ResolutionContext::new(today()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn derived_fields_for_pregnant_cull_cow() {
        let r = resolver();
        assert_eq!(calc(&r, "101", "Age").await, "4");
        assert_eq!(calc(&r, "101", "AgeInMonths").await, "48");
        assert_eq!(calc(&r, "101", "PregnancyMonths").await, "1");
        assert_eq!(calc(&r, "101", "OpenStatus").await, "No");
        assert_eq!(calc(&r, "101", "CullStatus").await, "Yes");
        assert_eq!(calc(&r, "101", "BreedingStatus").await, "Pregnant");
        assert_eq!(calc(&r, "101", "WeaningStatus").await, "Unweaned");
        assert_eq!(calc(&r, "101", "ExpectedDeliveryDate").await, "12/15/2024");
    }

    #[tokio::test]
    async fn derived_fields_for_exposed_cow() {
        let r = resolver();
        assert_eq!(calc(&r, "102", "Age").await, "");
        assert_eq!(calc(&r, "102", "PregnancyMonths").await, "");
        assert_eq!(calc(&r, "102", "OpenStatus").await, "Yes");
        assert_eq!(calc(&r, "102", "CullStatus").await, "No");
        assert_eq!(calc(&r, "102", "BreedingStatus").await, "Exposed");
        assert_eq!(calc(&r, "102", "WeaningStatus").await, "Weaned");
        assert_eq!(calc(&r, "102", "ExpectedDeliveryDate").await, "");
        assert_eq!(calc(&r, "999", "BreedingStatus").await, "Unknown");
    }

    #[tokio::test]
    async fn cull_status_is_no_for_any_other_status() {
        let mut unset = CowRecord::new("301");
        unset.status = None;
        let mut sold = CowRecord::new("302");
        sold.status = Some("Sold".into());
        let mut listed = CowRecord::new("303");
        listed.status = Some("CULL LIST, Current".into());
        let r = CalculatedResolver::new(Arc::new(
            InMemoryRanchStore::new()
                .with_cow(unset)
                .with_cow(sold)
                .with_cow(listed),
        ));

        assert_eq!(calc(&r, "301", "CullStatus").await, "No");
        assert_eq!(calc(&r, "302", "CullStatus").await, "No");
        assert_eq!(calc(&r, "303", "CullStatus").await, "No");
    }

    #[tokio::test]
    async fn pregnancy_months_needs_a_positive_recent_check() {
        let store = InMemoryRanchStore::new()
            .with_cow(CowRecord::new("401"))
            .with_cow(CowRecord::new("402"))
            .with_pregnancy_check(
                "401",
                None,
                PregnancyCheckRecord {
                    is_pregnant: Some(false),
                    preg_check_date: Some(day(2024, 5, 15)),
                    ..Default::default()
                },
            )
            .with_pregnancy_check(
                "402",
                None,
                PregnancyCheckRecord {
                    is_pregnant: Some(true),
                    preg_check_date: Some(day(2023, 5, 15)),
                    ..Default::default()
                },
            );
        let r = CalculatedResolver::new(Arc::new(store));

        // open at the check, even though a check date exists
        assert_eq!(calc(&r, "401", "PregnancyMonths").await, "");
        assert_eq!(calc(&r, "401", "OpenStatus").await, "Yes");
        // thirteen months since the check is stale
        assert_eq!(calc(&r, "402", "PregnancyMonths").await, "0");
        assert_eq!(calc(&r, "402", "OpenStatus").await, "No");
    }

    #[tokio::test]
    async fn open_latest_check_has_no_due_date() {
        let store = InMemoryRanchStore::new()
            .with_cow(CowRecord::new("501"))
            .with_pregnancy_check(
                "501",
                None,
                PregnancyCheckRecord {
                    is_pregnant: Some(true),
                    preg_check_date: Some(day(2024, 1, 10)),
                    months_pregnant: Some(3),
                    ..Default::default()
                },
            )
            .with_pregnancy_check(
                "501",
                None,
                PregnancyCheckRecord {
                    is_pregnant: Some(false),
                    preg_check_date: Some(day(2024, 5, 20)),
                    ..Default::default()
                },
            );
        let r = CalculatedResolver::new(Arc::new(store));
        assert_eq!(calc(&r, "501", "ExpectedDeliveryDate").await, "");
        assert_eq!(calc(&r, "501", "BreedingStatus").await, "Open");
    }

    #[tokio::test]
    async fn unknown_calculation_is_an_error() {
        let r = resolver();
        let result = r
            .value("101", "Horoscope", &ResolutionContext::new(today()))
            .await;
        assert!(matches!(result, Err(CellError::UnknownField { .. })));
    }
}
