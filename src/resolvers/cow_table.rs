//! Direct attribute lookups on the animal row

use std::sync::Arc;

use async_trait::async_trait;

use super::format::{opt_date, opt_number, opt_text};
use super::{ResolutionContext, SourceResolver};
use crate::error::{CellError, CellResult};
use crate::sheets::column::Source;
use crate::store::{CowRecord, RanchStore};

pub struct CowTableResolver {
    store: Arc<dyn RanchStore>,
}

impl CowTableResolver {
    pub fn new(store: Arc<dyn RanchStore>) -> Self {
        Self { store }
    }

    /// Whether any weaning record exists for the animal
    pub async fn is_weaned(&self, row_key: &str) -> CellResult<bool> {
        Ok(self.store.has_weaning_record(row_key).await?)
    }
}

fn field_value(cow: &CowRecord, field: &str) -> CellResult<String> {
    let value = match field {
        "CowTag" => cow.cow_tag.clone(),
        "Dam" => opt_text(cow.mother_tag.as_ref()),
        "Sire" => opt_text(cow.father_tag.as_ref()),
        "Sex" => opt_text(cow.sex.as_ref()),
        "DateOfBirth" => opt_date(cow.date_of_birth),
        "CurrentHerd" => opt_text(cow.current_herd.as_ref()),
        "Description" => opt_text(cow.description.as_ref()),
        "Breed" => opt_text(cow.breed.as_ref()),
        "Temperament" => opt_text(cow.temperament.as_ref()),
        "Status" => opt_text(cow.status.as_ref()),
        "RegCert" => opt_text(cow.reg_cert.as_ref()),
        "WeaningWeight" => opt_number(cow.weaning_weight),
        "WeaningDate" => opt_date(cow.weaning_date),
        "AnimalClass" => opt_text(cow.animal_class.as_ref()),
        _ => return Err(CellError::unknown("CowTable", field)),
    };
    Ok(value)
}

#[async_trait]
impl SourceResolver for CowTableResolver {
    fn source(&self) -> Source {
        Source::CowTable
    }

    async fn value(
        &self,
        row_key: &str,
        field: &str,
        _ctx: &ResolutionContext,
    ) -> CellResult<String> {
        match self.store.cow(row_key).await? {
            Some(cow) => field_value(&cow, field),
            None => Ok(String::new()),
        }
    }
}
