//! Column declarations and data paths
//!
//! A column declares where its value comes from with a data path of the form
//! `<Source>/<Field>`. The source set is closed; anything else parses to a
//! path with no source and resolves to an empty cell.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::instance::COPY_INSTANCE_SOURCE;
use crate::error::SheetError;

/// Key under which every resolved row carries its animal tag
pub const ROW_KEY_COLUMN: &str = "CowTag";

pub const FILLABLE_PREFIX: &str = "Fillable/";

/// Origin category of a column value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    CowTable,
    WeightRecords,
    MedicalTable,
    BreedingRecords,
    PregnancyCheck,
    CalvingRecords,
    Herds,
    Calculated,
    Fillable,
}

impl Source {
    pub const ALL: [Source; 9] = [
        Source::CowTable,
        Source::WeightRecords,
        Source::MedicalTable,
        Source::BreedingRecords,
        Source::PregnancyCheck,
        Source::CalvingRecords,
        Source::Herds,
        Source::Calculated,
        Source::Fillable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::CowTable => "CowTable",
            Source::WeightRecords => "WeightRecords",
            Source::MedicalTable => "MedicalTable",
            Source::BreedingRecords => "BreedingRecords",
            Source::PregnancyCheck => "PregnancyCheck",
            Source::CalvingRecords => "CalvingRecords",
            Source::Herds => "Herds",
            Source::Calculated => "Calculated",
            Source::Fillable => "Fillable",
        }
    }

    /// Parses a source name. Stored sheets may still use the table's
    /// historical spelling `PregancyCheck`.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "CowTable" => Some(Source::CowTable),
            "WeightRecords" => Some(Source::WeightRecords),
            "MedicalTable" => Some(Source::MedicalTable),
            "BreedingRecords" => Some(Source::BreedingRecords),
            "PregnancyCheck" | "PregancyCheck" => Some(Source::PregnancyCheck),
            "CalvingRecords" => Some(Source::CalvingRecords),
            "Herds" => Some(Source::Herds),
            "Calculated" => Some(Source::Calculated),
            "Fillable" => Some(Source::Fillable),
            _ => None,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed `<Source>/<Field>` path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPath<'a> {
    /// `None` when the source name is not one of the known sources
    pub source: Option<Source>,
    pub source_name: &'a str,
    pub field: &'a str,
}

impl<'a> DataPath<'a> {
    /// Splits on the first `/`. A path without a separator has an empty field.
    pub fn parse(raw: &'a str) -> Self {
        let (source_name, field) = raw.split_once('/').unwrap_or((raw, ""));
        Self {
            source: Source::parse(source_name),
            source_name,
            field,
        }
    }
}

fn default_column_type() -> String {
    "text".to_string()
}

/// One declared column of a sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDeclaration {
    pub key: String,
    pub name: String,
    pub data_path: String,
    #[serde(rename = "type", default = "default_column_type")]
    pub column_type: String,
    /// Value is captured into each sheet instance instead of resolved live
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub saved_per_instance: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_source: Option<String>,
}

impl ColumnDeclaration {
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        data_path: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            data_path: data_path.into(),
            column_type: default_column_type(),
            saved_per_instance: false,
            instance_source: None,
        }
    }

    /// Marks the column as captured by value into every sheet instance
    pub fn saved_as_copy(mut self) -> Self {
        self.saved_per_instance = true;
        self.instance_source = Some(COPY_INSTANCE_SOURCE.to_string());
        self
    }

    pub fn with_type(mut self, column_type: impl Into<String>) -> Self {
        self.column_type = column_type.into();
        self
    }

    pub fn path(&self) -> DataPath<'_> {
        DataPath::parse(&self.data_path)
    }

    pub fn is_fillable(&self) -> bool {
        self.data_path.starts_with(FILLABLE_PREFIX)
    }
}

/// Persisted shape of a sheet's columns: `{"columns": [...]}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SheetColumns {
    #[serde(default)]
    pub columns: Vec<ColumnDeclaration>,
}

impl SheetColumns {
    pub fn from_json(text: &str) -> Result<Self, SheetError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(columns: &[ColumnDeclaration]) -> Result<String, SheetError> {
        Ok(serde_json::to_string(&SheetColumns {
            columns: columns.to_vec(),
        })?)
    }
}

/// Final column list of a sheet: data columns followed by fillable columns
pub fn compose_columns(
    data_columns: Vec<ColumnDeclaration>,
    fillable_columns: Vec<ColumnDeclaration>,
) -> Vec<ColumnDeclaration> {
    let mut columns = data_columns;
    columns.extend(fillable_columns);
    columns
}

/// Checks a sheet name and column list before it is persisted
pub fn validate_definition(name: &str, columns: &[ColumnDeclaration]) -> Result<(), SheetError> {
    if name.trim().is_empty() {
        return Err(SheetError::InvalidDefinition(
            "sheet name must not be empty".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for column in columns {
        if column.key.trim().is_empty() {
            return Err(SheetError::InvalidDefinition(format!(
                "column '{}' has an empty key",
                column.name
            )));
        }
        if column.key == ROW_KEY_COLUMN {
            return Err(SheetError::InvalidDefinition(format!(
                "column key '{}' is reserved for the row identity",
                ROW_KEY_COLUMN
            )));
        }
        if !seen.insert(column.key.as_str()) {
            return Err(SheetError::InvalidDefinition(format!(
                "duplicate column key '{}'",
                column.key
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_and_unknown_sources() {
        let path = DataPath::parse("CowTable/Dam");
        assert_eq!(path.source, Some(Source::CowTable));
        assert_eq!(path.field, "Dam");

        let legacy = DataPath::parse("PregancyCheck/IsPregnant");
        assert_eq!(legacy.source, Some(Source::PregnancyCheck));

        let unknown = DataPath::parse("GoatTable/Tag");
        assert_eq!(unknown.source, None);
        assert_eq!(unknown.source_name, "GoatTable");
    }

    #[test]
    fn splits_on_first_separator_only() {
        let path = DataPath::parse("Fillable/Notes/Extra");
        assert_eq!(path.source, Some(Source::Fillable));
        assert_eq!(path.field, "Notes/Extra");

        let bare = DataPath::parse("Herds");
        assert_eq!(bare.source, Some(Source::Herds));
        assert_eq!(bare.field, "");
    }

    #[test]
    fn reads_persisted_columns_with_instance_flags() {
        let text = r#"{"columns":[
            {"key":"dob","name":"DOB","dataPath":"CowTable/DateOfBirth","type":"date"},
            {"key":"note","name":"Notes","dataPath":"Fillable/Notes","editable":true,"savedPerInstance":false},
            {"key":"wt","name":"Weight","dataPath":"WeightRecords/Latest","savedPerInstance":true,"instanceSource":"copy"}
        ]}"#;
        let parsed = SheetColumns::from_json(text).unwrap();
        assert_eq!(parsed.columns.len(), 3);
        assert_eq!(parsed.columns[0].column_type, "date");
        assert_eq!(parsed.columns[1].column_type, "text");
        assert!(parsed.columns[1].is_fillable());
        assert!(!parsed.columns[0].is_fillable());
        assert!(!parsed.columns[1].saved_per_instance);
        assert_eq!(
            parsed.columns[2],
            ColumnDeclaration::new("wt", "Weight", "WeightRecords/Latest").saved_as_copy()
        );
    }

    #[test]
    fn writes_data_path_in_camel_case() {
        let json = SheetColumns::to_json(&[ColumnDeclaration::new("age", "Age", "Calculated/Age")])
            .unwrap();
        assert!(json.contains(r#""dataPath":"Calculated/Age""#));
        assert!(json.contains(r#""type":"text""#));
        assert!(!json.contains("savedPerInstance"));

        let saved = SheetColumns::to_json(&[
            ColumnDeclaration::new("wt", "Weight", "WeightRecords/Latest").saved_as_copy(),
        ])
        .unwrap();
        assert!(saved.contains(r#""savedPerInstance":true"#));
        assert!(saved.contains(r#""instanceSource":"copy""#));
    }

    #[test]
    fn rejects_duplicate_and_reserved_keys() {
        let dup = vec![
            ColumnDeclaration::new("a", "A", "CowTable/Sex"),
            ColumnDeclaration::new("a", "B", "CowTable/Breed"),
        ];
        assert!(matches!(
            validate_definition("Sheet", &dup),
            Err(SheetError::InvalidDefinition(_))
        ));

        let reserved = vec![ColumnDeclaration::new("CowTag", "Tag", "CowTable/CowTag")];
        assert!(validate_definition("Sheet", &reserved).is_err());
        assert!(validate_definition("  ", &[]).is_err());
        assert!(validate_definition("Sheet", &[]).is_ok());
    }

    #[test]
    fn compose_keeps_fillable_columns_last() {
        let columns = compose_columns(
            vec![ColumnDeclaration::new("dam", "Dam", "CowTable/Dam")],
            vec![ColumnDeclaration::new("note", "Notes", "Fillable/Notes")],
        );
        assert_eq!(columns[0].key, "dam");
        assert_eq!(columns[1].key, "note");
    }
}
