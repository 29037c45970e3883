//! Column catalog
//!
//! The static list of data paths a sheet editor can offer, grouped by source.
//! Keys, editability, rendering types and select options are derived from the
//! display name and path.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use super::column::{DataPath, Source, FILLABLE_PREFIX};

const BASE_COLUMNS: &[(&str, &str)] = &[
    ("CowTag", "CowTable/CowTag"),
    ("Dam Tag", "CowTable/Dam"),
    ("Sire Tag", "CowTable/Sire"),
    ("Sex", "CowTable/Sex"),
    ("Date of Birth", "CowTable/DateOfBirth"),
    ("Current Herd", "CowTable/CurrentHerd"),
    ("Description", "CowTable/Description"),
    ("Breed", "CowTable/Breed"),
    ("Temperament", "CowTable/Temperament"),
    ("Status", "CowTable/Status"),
    ("RegCert", "CowTable/RegCert"),
    ("Weaning Weight", "CowTable/WeaningWeight"),
    ("Weaning Date", "CowTable/WeaningDate"),
    ("Animal Class", "CowTable/AnimalClass"),
    ("Current Weight", "WeightRecords/CurrentWeight"),
    ("Last Weight Date", "WeightRecords/LastWeightDate"),
    ("Latest Weight", "WeightRecords/Latest"),
    ("Latest Weight Date", "WeightRecords/LatestDate"),
    ("Vaccinations", "MedicalTable/Vaccinations"),
    ("All Treatments", "MedicalTable/AllTreatments"),
    ("Unique Treatments", "MedicalTable/UniqueTreatments"),
    ("Recent Issues", "MedicalTable/RecentIssues"),
    ("Primary Bull", "BreedingRecords/PrimaryBulls"),
    ("Cleanup Bull", "BreedingRecords/CleanupBulls"),
    ("Current Bull", "BreedingRecords/CurrentBull"),
    ("Exposure Start Date", "BreedingRecords/ExposureStartDate"),
    ("Exposure End Date", "BreedingRecords/ExposureEndDate"),
    ("Is Pregnant", "PregnancyCheck/IsPregnant"),
    ("Pregnancy Check Date", "PregnancyCheck/PregCheckDate"),
    ("Fetus Sex", "PregnancyCheck/FetusSex"),
    ("Months Pregnant", "PregnancyCheck/MonthsPregnant"),
    ("Pregnancy Weight", "PregnancyCheck/WeightAtCheck"),
    ("Pregnancy Notes", "PregnancyCheck/Notes"),
    ("Calf Tag", "CalvingRecords/CalfTag"),
    ("Calf Sex", "CalvingRecords/CalfSex"),
    ("Calf Birth Date", "CalvingRecords/BirthDate"),
    ("Calving Notes", "CalvingRecords/CalvingNotes"),
    ("Current Pasture", "Herds/CurrentPasture"),
    ("Age", "Calculated/Age"),
    ("Age in Months", "Calculated/AgeInMonths"),
    ("Pregnancy Months", "Calculated/PregnancyMonths"),
    ("Open Status", "Calculated/OpenStatus"),
    ("Cull Status", "Calculated/CullStatus"),
    ("Breeding Status", "Calculated/BreedingStatus"),
    ("Weaning Status", "Calculated/WeaningStatus"),
    ("Expected Delivery Date", "Calculated/ExpectedDeliveryDate"),
    ("Notes", "Fillable/Notes"),
    ("New Weight", "Fillable/Weight"),
    ("Date", "Fillable/Date"),
];

/// First matching keyword group wins
const TYPE_KEYWORDS: &[(&str, &[&str])] = &[
    ("date", &["Date"]),
    ("number", &["Weight", "Months"]),
    ("select", &["IsPregnant", "Sex", "Status", "Breed", "Temperament"]),
    ("text", &["Notes", "Description"]),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub key: String,
    pub display_name: String,
    pub data_path: String,
    pub editable: bool,
    #[serde(rename = "type")]
    pub column_type: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogGroup {
    pub source: Source,
    pub columns: Vec<CatalogEntry>,
}

fn whitespace() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static pattern"))
}

fn non_word() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w]").expect("static pattern"))
}

/// Lowercased display name with whitespace runs as `_` and other non-word
/// characters dropped
pub fn column_key(display_name: &str) -> String {
    let lowered = display_name.to_lowercase();
    let underscored = whitespace().replace_all(&lowered, "_");
    non_word().replace_all(&underscored, "").into_owned()
}

pub fn column_type(data_path: &str) -> &'static str {
    TYPE_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| data_path.contains(k)))
        .map(|(kind, _)| *kind)
        .unwrap_or("text")
}

pub fn column_options(data_path: &str) -> &'static [&'static str] {
    match data_path {
        "PregnancyCheck/IsPregnant" => &["", "Yes", "No"],
        "PregnancyCheck/FetusSex" | "CalvingRecords/CalfSex" => &["", "Heifer", "Bull"],
        "CowTable/Sex" => &["", "Cow", "Bull", "Steer", "Heifer"],
        "CowTable/Status" => &["", "Current", "Target Sale", "Undefined", "Cull"],
        _ => &[],
    }
}

fn entry(display_name: &str, data_path: &str) -> CatalogEntry {
    CatalogEntry {
        key: column_key(display_name),
        display_name: display_name.to_string(),
        data_path: data_path.to_string(),
        editable: data_path.starts_with(FILLABLE_PREFIX),
        column_type: column_type(data_path).to_string(),
        options: column_options(data_path)
            .iter()
            .map(|o| o.to_string())
            .collect(),
    }
}

/// Every known data path, grouped by source in source order
pub fn column_catalog() -> Vec<CatalogGroup> {
    Source::ALL
        .iter()
        .map(|source| CatalogGroup {
            source: *source,
            columns: BASE_COLUMNS
                .iter()
                .filter(|(_, path)| DataPath::parse(path).source == Some(*source))
                .map(|(name, path)| entry(name, path))
                .collect(),
        })
        .filter(|group| !group.columns.is_empty())
        .collect()
}
