//! Tablecast: schema-normalizing table engine with composable
//! relational transforms.
//!
//! Tablecast ingests raw CSV data, infers or applies per-column
//! semantic types, normalizes values into typed columns, and exposes a
//! declarative set of table-to-table transforms culminating in a
//! concentration analysis (the share of a measure contributed by the
//! top fractions of each group).
//!
//! # Core principles
//!
//! - **Copy-on-apply**: a transform never mutates its input table; every
//!   application produces a fresh table.
//! - **Explicit types**: every column carries a type tag; classification
//!   queries (dimensions, measures) are plain scans over those tags.
//! - **Validated configuration**: transform parameters are checked at
//!   construction, schema proposals are dry-run before acceptance.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tablecast::{ConcentrationAnalysisTransform, Loader, MockOracle, Transform};
//!
//! let loader = Loader::new().with_oracle(Arc::new(MockOracle::new()));
//! let table = loader.load_path("sales.csv", None).unwrap();
//!
//! let analysis = ConcentrationAnalysisTransform::new("revenue", vec!["category".into()]);
//! let report = analysis.apply(&table).unwrap();
//! println!("{:?}", report.data.column_names());
//! ```

pub mod error;
pub mod loader;
pub mod oracle;
pub mod schema;
pub mod table;
pub mod transform;

pub use error::{Result, TablecastError};
pub use loader::Loader;
pub use oracle::{
    infer_schema, AnthropicOracle, MockOracle, OracleConfig, OracleFeedback, SchemaOracle,
};
pub use schema::{ColumnSchema, DataType, DatetimePart, PartialDatetimeSchema};
pub use table::{Column, ColumnType, Frame, Table, TableSource, Value};
pub use transform::{
    apply_chain, ColumnSchemaTransform, ConcentrationAnalysisTransform,
    DefaultColumnSortingTransform, FilterTransform, FusePartialDatetimeColumnsTransform,
    PivotTransform, QuantileLabelTransform, StringToCategoricalTransform, SumTransform, Transform,
    VerticalConcatenateTransform,
};
