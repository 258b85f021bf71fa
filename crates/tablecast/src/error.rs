//! Error types for the tablecast library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for tablecast operations.
#[derive(Debug, Error)]
pub enum TablecastError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Input file does not exist.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// File format not supported.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Empty table handed to a transform, or no data to load.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Requested columns, dimensions or measures are missing, or a
    /// transform was configured with inconsistent parameters.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Cell-level cast, cleaning or datetime-format failure.
    #[error("Parse error for column '{column}': {message}")]
    Parse { column: String, message: String },

    /// Schema inference exhausted its retry budget.
    #[error("Schema inference failed after {attempts} attempt(s): {message}")]
    Oracle { attempts: usize, message: String },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Regex compilation error.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl TablecastError {
    /// Build a parse error for a named column.
    pub fn parse(column: impl Into<String>, message: impl Into<String>) -> Self {
        TablecastError::Parse {
            column: column.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for tablecast operations.
pub type Result<T> = std::result::Result<T, TablecastError>;
