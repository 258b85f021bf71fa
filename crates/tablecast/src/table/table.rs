//! The table entity: named, sourced, typed relational data.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TablecastError};
use super::frame::{ColumnType, Frame};

/// Where a table's data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableSource {
    /// Loaded from a raw data file.
    RawFile,
    /// Queried from a database.
    Database,
    /// Fetched from an API.
    Api,
    /// Derived from other tables.
    ComposedFile,
    /// Consumed from a stream.
    Stream,
    /// Anything else.
    Other,
}

/// A named, typed relational dataset.
///
/// Column classifications (categorical, datetime, dimension, numeric) are
/// derived from the current column type tags on every call; they are never
/// cached, so they cannot go stale when a transform retags a column.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Name of the table.
    pub name: String,
    /// Source of the table.
    pub source: TableSource,
    /// The data in the table.
    pub data: Frame,
    /// Path the table was loaded from, when file-backed.
    pub path: Option<PathBuf>,
    /// Query that produced the table, when database-backed.
    pub query: Option<String>,
}

impl Table {
    /// Create a table with no provenance.
    pub fn new(name: impl Into<String>, source: TableSource, data: Frame) -> Self {
        Self {
            name: name.into(),
            source,
            data,
            path: None,
            query: None,
        }
    }

    /// Record the file path the table was loaded from.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Record the query that produced the table.
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Columns holding category labels or free text.
    pub fn categorical_columns(&self) -> Vec<String> {
        self.data
            .iter()
            .filter(|(_, c)| {
                matches!(
                    c.column_type(),
                    ColumnType::Categorical | ColumnType::Text
                )
            })
            .map(|(n, _)| n.clone())
            .collect()
    }

    /// Columns holding date/time values.
    pub fn datetime_columns(&self) -> Vec<String> {
        self.data
            .iter()
            .filter(|(_, c)| c.column_type().is_temporal())
            .map(|(n, _)| n.clone())
            .collect()
    }

    /// Columns usable for grouping and pivoting: categorical then datetime.
    pub fn dimension_columns(&self) -> Vec<String> {
        let mut columns = self.categorical_columns();
        columns.extend(self.datetime_columns());
        columns
    }

    /// Columns usable for aggregation.
    pub fn numeric_columns(&self) -> Vec<String> {
        self.data
            .iter()
            .filter(|(_, c)| c.column_type().is_numeric())
            .map(|(n, _)| n.clone())
            .collect()
    }

    /// Validate that the named columns exist in the table.
    pub fn validate_columns(&self, columns: &[String]) -> Result<()> {
        let missing = missing_from(columns, &self.data.column_names());
        if missing.is_empty() {
            Ok(())
        } else {
            Err(TablecastError::Validation(format!(
                "column(s) {:?} not found in table '{}'",
                missing, self.name
            )))
        }
    }

    /// Validate that the named columns are dimensions of the table.
    pub fn validate_dimensions(&self, dimensions: &[String]) -> Result<()> {
        let missing = missing_from(dimensions, &self.dimension_columns());
        if missing.is_empty() {
            Ok(())
        } else {
            Err(TablecastError::Validation(format!(
                "dimension(s) {:?} not dimensions of table '{}'",
                missing, self.name
            )))
        }
    }

    /// Validate that the named columns are measures of the table.
    pub fn validate_measures(&self, measures: &[String]) -> Result<()> {
        let missing = missing_from(measures, &self.numeric_columns());
        if missing.is_empty() {
            Ok(())
        } else {
            Err(TablecastError::Validation(format!(
                "measure(s) {:?} not found in table '{}'",
                missing, self.name
            )))
        }
    }
}

fn missing_from(requested: &[String], available: &[String]) -> Vec<String> {
    requested
        .iter()
        .filter(|name| !available.contains(name))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Column, ColumnType};

    fn sample_table() -> Table {
        let frame = Frame::with_columns(vec![
            (
                "region".to_string(),
                Column::Categorical(vec![Some("North".into()), Some("South".into())]),
            ),
            (
                "note".to_string(),
                Column::Text(vec![Some("x".into()), Some("y".into())]),
            ),
            (
                "when".to_string(),
                Column::DateTime(vec![None, None]),
            ),
            (
                "sales".to_string(),
                Column::Integer(vec![Some(10), Some(20)]),
            ),
            (
                "rate".to_string(),
                Column::Float(vec![Some(0.5), Some(0.7)]),
            ),
            (
                "active".to_string(),
                Column::Boolean(vec![Some(true), Some(false)]),
            ),
        ])
        .unwrap();
        Table::new("sample", TableSource::Other, frame)
    }

    #[test]
    fn test_column_classifications() {
        let table = sample_table();
        assert_eq!(table.categorical_columns(), vec!["region", "note"]);
        assert_eq!(table.datetime_columns(), vec!["when"]);
        assert_eq!(table.dimension_columns(), vec!["region", "note", "when"]);
        assert_eq!(table.numeric_columns(), vec!["sales", "rate"]);
    }

    #[test]
    fn test_classifications_follow_retags() {
        let mut table = sample_table();
        // Demote "note" from text to categorical; the classification is
        // recomputed, not cached.
        table
            .data
            .insert(
                "note",
                Column::Categorical(vec![Some("x".into()), Some("y".into())]),
            )
            .unwrap();
        assert_eq!(table.categorical_columns(), vec!["region", "note"]);
        assert_eq!(
            table.data.column("note").unwrap().column_type(),
            ColumnType::Categorical
        );
    }

    #[test]
    fn test_validate_columns_names_missing() {
        let table = sample_table();
        assert!(table.validate_columns(&["region".to_string()]).is_ok());
        let err = table
            .validate_columns(&["region".to_string(), "absent".to_string()])
            .unwrap_err();
        assert!(err.to_string().contains("absent"));
        assert!(!err.to_string().contains("\"region\""));
    }

    #[test]
    fn test_validate_dimensions_rejects_measures() {
        let table = sample_table();
        assert!(table
            .validate_dimensions(&["region".to_string(), "when".to_string()])
            .is_ok());
        let err = table
            .validate_dimensions(&["sales".to_string()])
            .unwrap_err();
        assert!(err.to_string().contains("sales"));
    }

    #[test]
    fn test_validate_measures_rejects_dimensions() {
        let table = sample_table();
        assert!(table
            .validate_measures(&["sales".to_string(), "rate".to_string()])
            .is_ok());
        let err = table
            .validate_measures(&["region".to_string()])
            .unwrap_err();
        assert!(err.to_string().contains("region"));
    }
}
