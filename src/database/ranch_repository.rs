//! Postgres ranch store
//!
//! One parameterized query per lookup. Breeding, pregnancy and calving
//! queries take an optional plan year; a null binding disables the filter.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use crate::store::{
    BreedingRecord, CalvingRecord, CowRecord, IssueRecord, PregnancyCheckRecord, RanchStore,
    TreatmentRecord, WeightRecord,
};

#[derive(Clone, Debug)]
pub struct PgRanchStore {
    pool: PgPool,
}

impl PgRanchStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RanchStore for PgRanchStore {
    async fn cow(&self, cow_tag: &str) -> Result<Option<CowRecord>> {
        sqlx::query_as::<_, CowRecord>(
            r#"
            SELECT cow_tag, mother_tag, father_tag, sex, date_of_birth, current_herd,
                   description, breed, temperament, status, reg_cert, weaning_weight,
                   weaning_date, animal_class
            FROM cows
            WHERE cow_tag = $1
            "#,
        )
        .bind(cow_tag)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Failed to load cow {}", cow_tag))
    }

    async fn last_recorded_weight(&self, cow_tag: &str) -> Result<Option<WeightRecord>> {
        sqlx::query_as::<_, WeightRecord>(
            r#"
            SELECT w.weight, w.time_recorded
            FROM cows c
            JOIN weight_records w ON w.id = c.last_weight_id
            WHERE c.cow_tag = $1
            "#,
        )
        .bind(cow_tag)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Failed to load last recorded weight for {}", cow_tag))
    }

    async fn latest_weight(&self, cow_tag: &str) -> Result<Option<WeightRecord>> {
        sqlx::query_as::<_, WeightRecord>(
            r#"
            SELECT weight, time_recorded
            FROM weight_records
            WHERE cow_tag = $1
            ORDER BY time_recorded DESC NULLS LAST
            LIMIT 1
            "#,
        )
        .bind(cow_tag)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Failed to load latest weight for {}", cow_tag))
    }

    async fn treatments(&self, cow_tag: &str) -> Result<Vec<TreatmentRecord>> {
        sqlx::query_as::<_, TreatmentRecord>(
            r#"
            SELECT treatment_medicine AS medicine, treatment_date
            FROM medical_records
            WHERE cow_tag = $1 AND treatment_medicine IS NOT NULL
            ORDER BY treatment_date DESC NULLS LAST
            "#,
        )
        .bind(cow_tag)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Failed to load treatments for {}", cow_tag))
    }

    async fn vaccinations(&self, cow_tag: &str) -> Result<Vec<TreatmentRecord>> {
        sqlx::query_as::<_, TreatmentRecord>(
            r#"
            SELECT mr.treatment_medicine AS medicine, mr.treatment_date
            FROM medical_records mr
            JOIN medicines m ON m.medicine = mr.treatment_medicine
            WHERE mr.cow_tag = $1 AND m.is_immunization = TRUE
            ORDER BY mr.treatment_date DESC NULLS LAST
            "#,
        )
        .bind(cow_tag)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Failed to load vaccinations for {}", cow_tag))
    }

    async fn open_issues(&self, cow_tag: &str) -> Result<Vec<IssueRecord>> {
        sqlx::query_as::<_, IssueRecord>(
            r#"
            SELECT COALESCE(issue_description, '') AS description,
                   issue_observation_date AS observed_on
            FROM medical_records
            WHERE cow_tag = $1 AND issue = TRUE AND issue_resolved = FALSE
            ORDER BY issue_observation_date DESC NULLS LAST
            "#,
        )
        .bind(cow_tag)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Failed to load open issues for {}", cow_tag))
    }

    async fn breeding_records(
        &self,
        cow_tag: &str,
        plan_year: Option<i32>,
    ) -> Result<Vec<BreedingRecord>> {
        sqlx::query_as::<_, BreedingRecord>(
            r#"
            SELECT br.primary_bulls, br.cleanup_bulls,
                   br.exposure_start_date, br.exposure_end_date
            FROM breeding_records br
            LEFT JOIN breeding_plans bp ON bp.id = br.plan_id
            WHERE br.cow_tag = $1
            AND ($2::INTEGER IS NULL OR bp.plan_year = $2)
            ORDER BY br.exposure_start_date DESC NULLS LAST
            "#,
        )
        .bind(cow_tag)
        .bind(plan_year)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Failed to load breeding records for {}", cow_tag))
    }

    async fn latest_pregnancy_check(
        &self,
        cow_tag: &str,
        plan_year: Option<i32>,
    ) -> Result<Option<PregnancyCheckRecord>> {
        sqlx::query_as::<_, PregnancyCheckRecord>(
            r#"
            SELECT pc.is_pregnant, pc.preg_check_date, pc.fetus_sex,
                   w.weight AS weight_at_check, pc.notes, pc.months_pregnant
            FROM pregnancy_checks pc
            LEFT JOIN weight_records w ON w.id = pc.weight_record_id
            LEFT JOIN breeding_records br ON br.id = pc.breeding_record_id
            LEFT JOIN breeding_plans bp ON bp.id = br.plan_id
            WHERE pc.cow_tag = $1
            AND ($2::INTEGER IS NULL OR bp.plan_year = $2)
            ORDER BY pc.preg_check_date DESC NULLS LAST
            LIMIT 1
            "#,
        )
        .bind(cow_tag)
        .bind(plan_year)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Failed to load pregnancy check for {}", cow_tag))
    }

    async fn latest_calving(
        &self,
        dam_tag: &str,
        plan_year: Option<i32>,
    ) -> Result<Option<CalvingRecord>> {
        sqlx::query_as::<_, CalvingRecord>(
            r#"
            SELECT cr.calf_tag, cr.calf_sex, cr.birth_date, cr.calving_notes
            FROM calving_records cr
            LEFT JOIN breeding_records br ON br.id = cr.breeding_record_id
            LEFT JOIN breeding_plans bp ON bp.id = br.plan_id
            WHERE cr.dam_tag = $1
            AND ($2::INTEGER IS NULL OR bp.plan_year = $2)
            ORDER BY cr.birth_date DESC NULLS LAST
            LIMIT 1
            "#,
        )
        .bind(dam_tag)
        .bind(plan_year)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Failed to load calving record for {}", dam_tag))
    }

    async fn current_pasture(&self, cow_tag: &str) -> Result<Option<String>> {
        let pasture: Option<Option<String>> = sqlx::query_scalar(
            r#"
            SELECT h.current_pasture
            FROM cows c
            JOIN herds h ON h.herd_name = c.current_herd
            WHERE c.cow_tag = $1
            "#,
        )
        .bind(cow_tag)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Failed to load pasture for {}", cow_tag))?;

        Ok(pasture.flatten())
    }

    async fn has_weaning_record(&self, cow_tag: &str) -> Result<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM weaning_records WHERE cow_tag = $1)",
        )
        .bind(cow_tag)
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("Failed to check weaning records for {}", cow_tag))
    }

    async fn herd_members(&self, herd_name: &str) -> Result<Vec<String>> {
        let tags = sqlx::query_scalar::<_, String>(
            r#"
            SELECT cow_tag
            FROM cows
            WHERE current_herd = $1 AND cow_tag IS NOT NULL
            ORDER BY cow_tag
            "#,
        )
        .bind(herd_name)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Failed to load members of herd {}", herd_name))?;

        debug!("Herd {} has {} members", herd_name, tags.len());
        Ok(tags)
    }

    async fn animals_with_status(&self, statuses: &[&str]) -> Result<Vec<String>> {
        let statuses: Vec<String> = statuses.iter().map(|s| s.to_string()).collect();
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT cow_tag
            FROM cows
            WHERE cow_tag IS NOT NULL
            AND (status IS NULL OR status = ANY($1))
            ORDER BY cow_tag
            "#,
        )
        .bind(&statuses)
        .fetch_all(&self.pool)
        .await
        .context("Failed to load active animals")
    }
}
