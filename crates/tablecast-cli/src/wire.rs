//! JSON wire types for the web service.

use serde::{Deserialize, Serialize};
use tablecast::{Table, TableSource};

/// Structured table data response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableData {
    /// Name of the table.
    pub name: String,
    /// Source of the table data.
    pub source: TableSource,
    /// Cache key for the table.
    pub cache_key: String,
    /// Column names in table order.
    pub columns: Vec<String>,
    /// Table shape as (rows, columns).
    pub shape: (usize, usize),
    /// Row slice as JSON maps.
    pub data: Vec<serde_json::Map<String, serde_json::Value>>,
    /// Dimension columns (categorical plus datetime).
    pub dimension_columns: Vec<String>,
    /// Numeric columns.
    pub numeric_columns: Vec<String>,
    /// Datetime columns.
    pub datetime_columns: Vec<String>,
    /// Categorical columns.
    pub categorical_columns: Vec<String>,
}

impl TableData {
    /// Build the wire representation of a table, with a row window for
    /// large tables.
    pub fn from_table(
        table: &Table,
        cache_key: impl Into<String>,
        offset: usize,
        limit: usize,
    ) -> Self {
        Self {
            name: table.name.clone(),
            source: table.source,
            cache_key: cache_key.into(),
            columns: table.data.column_names(),
            shape: table.data.shape(),
            data: table.data.to_records(offset, limit),
            dimension_columns: table.dimension_columns(),
            numeric_columns: table.numeric_columns(),
            datetime_columns: table.datetime_columns(),
            categorical_columns: table.categorical_columns(),
        }
    }
}

/// Response for file upload operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadFileResponse {
    pub success: bool,
    pub message: String,
    /// Key the uploaded file is stored under.
    pub file_key: String,
    /// Original filename.
    pub filename: String,
    /// Size of the uploaded file in bytes.
    pub size: usize,
}

/// Response for file loading operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadFileResponse {
    pub success: bool,
    pub table: TableData,
    pub message: String,
    /// Key the file was loaded from.
    pub file_key: String,
}

/// Request for a concentration analysis on a cached table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcentrationAnalysisRequest {
    /// Cache key of the table to analyze.
    pub cache_key: String,
    /// Measure column.
    pub on: String,
    /// Dimension columns to partition by.
    pub by: Vec<String>,
}

/// Response for concentration analysis operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcentrationAnalysisResponse {
    pub success: bool,
    pub table: TableData,
    pub message: String,
    /// Columns used for pivoting.
    pub pivot_by: Vec<String>,
    /// Column used as the concentration measure.
    pub concentration_measure: String,
}
