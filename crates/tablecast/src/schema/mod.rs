//! Column schema model: the contract between the inference oracle and the
//! formatting transforms.

use serde::{Deserialize, Serialize};

/// Semantic data type a raw column should be cast to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// Text data, IDs, categories.
    #[serde(rename = "string")]
    Text,
    /// Whole numbers.
    Integer,
    /// Decimal numbers, currency, percentages.
    Float,
    /// True/false, yes/no.
    Boolean,
    /// Temporal data.
    #[serde(rename = "datetime")]
    DateTime,
}

/// One component of a composite timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatetimePart {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
}

impl DatetimePart {
    /// Default component value used when a part column is absent.
    /// The year has no default; a missing year is an error.
    pub fn default_value(&self) -> Option<i64> {
        match self {
            DatetimePart::Year => None,
            DatetimePart::Month | DatetimePart::Day => Some(1),
            DatetimePart::Hour | DatetimePart::Minute | DatetimePart::Second => Some(0),
        }
    }
}

/// Marks a column as holding one part of a composite datetime column.
///
/// Columns sharing a `parent_column_name` are fused into a single
/// datetime column of that name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialDatetimeSchema {
    /// The part of the datetime this column represents.
    pub part: DatetimePart,
    /// Name of the composite datetime column to create.
    #[serde(default = "default_parent_column_name")]
    pub parent_column_name: String,
}

fn default_parent_column_name() -> String {
    "Date".to_string()
}

/// Per-column parsing instructions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    /// Name of the column.
    pub name: String,
    /// Data type to cast the column to.
    pub data_type: DataType,
    /// Character-exclusion pattern: characters matching it are stripped
    /// before casting. Empty means no cleaning. The oracle contract
    /// forbids lookaround assertions; the regex crate rejects them at
    /// compile time.
    #[serde(default)]
    pub regex_cleaning_pattern: String,
    /// Parse pattern for datetime columns (e.g. `%Y-%m-%d %H:%M:%S`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datetime_format: Option<String>,
    /// Set when the column holds a single part of a composite datetime.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial_datetime_schema: Option<PartialDatetimeSchema>,
}

impl ColumnSchema {
    /// Create a schema with no cleaning pattern.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            regex_cleaning_pattern: String::new(),
            datetime_format: None,
            partial_datetime_schema: None,
        }
    }

    /// Set the cleaning pattern.
    pub fn with_cleaning_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.regex_cleaning_pattern = pattern.into();
        self
    }

    /// Set the datetime parse format.
    pub fn with_datetime_format(mut self, format: impl Into<String>) -> Self {
        self.datetime_format = Some(format.into());
        self
    }

    /// Mark the column as a datetime part.
    pub fn with_datetime_part(
        mut self,
        part: DatetimePart,
        parent_column_name: impl Into<String>,
    ) -> Self {
        self.partial_datetime_schema = Some(PartialDatetimeSchema {
            part,
            parent_column_name: parent_column_name.into(),
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_round_trip() {
        let schema = ColumnSchema::new("salary", DataType::Float)
            .with_cleaning_pattern(r"[^\d.-]");
        let json = serde_json::to_string(&schema).unwrap();
        assert!(json.contains("\"data_type\":\"float\""));
        let back: ColumnSchema = serde_json::from_str(&json).unwrap();
        assert_eq!(back, schema);
    }

    #[test]
    fn test_wire_type_names() {
        let text: DataType = serde_json::from_str("\"string\"").unwrap();
        assert_eq!(text, DataType::Text);
        let dt: DataType = serde_json::from_str("\"datetime\"").unwrap();
        assert_eq!(dt, DataType::DateTime);
    }

    #[test]
    fn test_parent_column_name_defaults() {
        let json = r#"{"part": "year"}"#;
        let partial: PartialDatetimeSchema = serde_json::from_str(json).unwrap();
        assert_eq!(partial.parent_column_name, "Date");
    }

    #[test]
    fn test_part_defaults() {
        assert_eq!(DatetimePart::Year.default_value(), None);
        assert_eq!(DatetimePart::Month.default_value(), Some(1));
        assert_eq!(DatetimePart::Day.default_value(), Some(1));
        assert_eq!(DatetimePart::Hour.default_value(), Some(0));
        assert_eq!(DatetimePart::Minute.default_value(), Some(0));
        assert_eq!(DatetimePart::Second.default_value(), Some(0));
    }
}
