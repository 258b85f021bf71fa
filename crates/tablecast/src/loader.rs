//! CSV ingestion and normalization: raw bytes in, typed and
//! canonically-ordered table out.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::info;

use crate::error::{Result, TablecastError};
use crate::oracle::{infer_schema, SchemaOracle, DEFAULT_MAX_ATTEMPTS};
use crate::schema::ColumnSchema;
use crate::table::{Column, Frame, Table, TableSource};
use crate::transform::{
    apply_chain, ColumnSchemaTransform, DefaultColumnSortingTransform,
    FusePartialDatetimeColumnsTransform, StringToCategoricalTransform, Transform,
};

/// Rows sampled for schema inference.
const SAMPLE_ROWS: usize = 100;

/// Loads CSV data and runs the canonical formatting pipeline: schema
/// application, datetime-part fusion, categorical demotion, column
/// ordering.
pub struct Loader {
    oracle: Option<Arc<dyn SchemaOracle>>,
    max_oracle_attempts: usize,
}

impl Loader {
    /// Create a loader without an inference oracle; every load must
    /// supply an explicit schema.
    pub fn new() -> Self {
        Self {
            oracle: None,
            max_oracle_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Attach a schema inference oracle for loads without an explicit
    /// schema.
    pub fn with_oracle(mut self, oracle: Arc<dyn SchemaOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Override the oracle retry budget.
    pub fn with_max_oracle_attempts(mut self, attempts: usize) -> Self {
        self.max_oracle_attempts = attempts;
        self
    }

    /// Load a CSV file from disk.
    pub fn load_path(
        &self,
        path: impl AsRef<Path>,
        schemas: Option<Vec<ColumnSchema>>,
    ) -> Result<Table> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(TablecastError::FileNotFound(path.to_path_buf()));
        }
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if extension != "csv" {
            return Err(TablecastError::UnsupportedFormat(format!(
                "expected a .csv file, got: {}",
                path.display()
            )));
        }

        let bytes = fs::read(path).map_err(|e| TablecastError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let mut table = self.load_bytes(&bytes, &name, schemas)?;
        table.path = Some(path.to_path_buf());
        Ok(table)
    }

    /// Load a CSV from raw bytes.
    pub fn load_bytes(
        &self,
        bytes: &[u8],
        name: &str,
        schemas: Option<Vec<ColumnSchema>>,
    ) -> Result<Table> {
        let hash = format!("sha256:{:x}", Sha256::digest(bytes));
        let frame = read_csv(bytes)?;
        info!(
            name,
            rows = frame.height(),
            columns = frame.width(),
            %hash,
            "loaded csv"
        );

        let table = Table::new(name, TableSource::RawFile, frame);

        let schemas = match schemas {
            Some(schemas) => schemas,
            None => {
                let oracle = self.oracle.as_ref().ok_or_else(|| {
                    TablecastError::Config(
                        "no schema supplied and no inference oracle configured".to_string(),
                    )
                })?;
                let sample = sample_rows(&table.data, SAMPLE_ROWS);
                infer_schema(oracle.as_ref(), &sample, self.max_oracle_attempts)?
            }
        };

        self.format_table(table, schemas)
    }

    /// Apply the canonical formatting pipeline.
    fn format_table(&self, table: Table, schemas: Vec<ColumnSchema>) -> Result<Table> {
        let transforms: Vec<Box<dyn Transform>> = vec![
            Box::new(ColumnSchemaTransform::new(schemas.clone())?),
            Box::new(FusePartialDatetimeColumnsTransform::new(schemas)),
            Box::new(StringToCategoricalTransform::default()),
            Box::new(DefaultColumnSortingTransform),
        ];
        apply_chain(&transforms, &table)
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse CSV bytes into an all-text frame. Leading/trailing whitespace
/// is stripped; empty cells become nulls; short rows are padded and
/// long rows truncated to the header width.
fn read_csv(bytes: &[u8]) -> Result<Frame> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
    if headers.is_empty() {
        return Err(TablecastError::EmptyData("no columns found".to_string()));
    }

    let mut columns: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    for record in reader.records() {
        let record = record?;
        for (index, cells) in columns.iter_mut().enumerate() {
            let cell = record.get(index).map(str::trim).unwrap_or("");
            cells.push(if cell.is_empty() {
                None
            } else {
                Some(cell.to_string())
            });
        }
    }

    Frame::with_columns(
        headers
            .into_iter()
            .zip(columns)
            .map(|(name, cells)| (name, Column::Text(cells)))
            .collect(),
    )
}

/// Take up to `limit` rows for inference, sampling without replacement
/// (in original row order) when the frame is larger.
fn sample_rows(frame: &Frame, limit: usize) -> Frame {
    if frame.height() <= limit {
        return frame.clone();
    }
    let mut indices: Vec<usize> = (0..frame.height()).collect();
    fastrand::shuffle(&mut indices);
    indices.truncate(limit);
    indices.sort_unstable();
    frame.take_rows(&indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::MockOracle;
    use crate::schema::DataType;
    use crate::table::{ColumnType, Value};

    const CSV: &[u8] = b"category,revenue,when\nA,\"$1,000\",2023-01-01\nB,\"$2,000\",2023-01-02\nA,\"$3,000\",2023-01-03\n";

    #[test]
    fn test_read_csv_nulls_and_padding() {
        let frame = read_csv(b"a,b\n1,\n2\n").unwrap();
        assert_eq!(frame.shape(), (2, 2));
        assert_eq!(frame.column("b").unwrap().get(0), Value::Null);
        assert_eq!(frame.column("b").unwrap().get(1), Value::Null);
        assert_eq!(frame.column("a").unwrap().get(1), Value::Text("2".into()));
    }

    #[test]
    fn test_load_bytes_with_explicit_schema() {
        let schemas = vec![
            ColumnSchema::new("category", DataType::Text),
            ColumnSchema::new("revenue", DataType::Float).with_cleaning_pattern(r"[^0-9.\-]"),
            ColumnSchema::new("when", DataType::DateTime).with_datetime_format("%Y-%m-%d"),
        ];
        let table = Loader::new()
            .load_bytes(CSV, "sales.csv", Some(schemas))
            .unwrap();
        // Canonical order: datetime, dimensions, numerics.
        assert_eq!(table.data.column_names(), vec!["when", "category", "revenue"]);
        assert_eq!(
            table.data.column("revenue").unwrap().get(0),
            Value::Float(1000.0)
        );
        // Two distinct labels over three rows is 67% uniqueness, above
        // the default 10% threshold, so the column stays text.
        assert_eq!(
            table.data.column("category").unwrap().column_type(),
            ColumnType::Text
        );
        assert_eq!(table.source, TableSource::RawFile);
    }

    #[test]
    fn test_load_bytes_with_mock_oracle() {
        let loader = Loader::new().with_oracle(Arc::new(MockOracle::new()));
        let table = loader.load_bytes(CSV, "sales.csv", None).unwrap();
        assert!(table
            .data
            .column("revenue")
            .unwrap()
            .column_type()
            .is_numeric());
        assert_eq!(
            table.data.column("when").unwrap().column_type(),
            ColumnType::DateTime
        );
    }

    #[test]
    fn test_load_bytes_without_oracle_or_schema() {
        let err = Loader::new().load_bytes(CSV, "sales.csv", None).unwrap_err();
        assert!(matches!(err, TablecastError::Config(_)));
    }

    #[test]
    fn test_load_path_not_found() {
        let err = Loader::new()
            .load_path("/definitely/not/here.csv", None)
            .unwrap_err();
        assert!(matches!(err, TablecastError::FileNotFound(_)));
    }

    #[test]
    fn test_sample_rows_bounds() {
        let frame = read_csv(b"a\n1\n2\n3\n").unwrap();
        assert_eq!(sample_rows(&frame, 100).height(), 3);
        assert_eq!(sample_rows(&frame, 2).height(), 2);
    }
}
