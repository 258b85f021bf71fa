//! Mock schema oracle with deterministic, rule-based proposals for
//! testing and offline use.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::Result;
use crate::schema::{ColumnSchema, DataType};
use crate::table::{Column, Frame};

use super::{OracleFeedback, SchemaOracle};

/// Datetime shapes the mock oracle recognizes, with the format needed
/// to parse them.
static DATETIME_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}$").expect("static pattern"),
            "%Y-%m-%dT%H:%M:%S",
        ),
        (
            Regex::new(r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}$").expect("static pattern"),
            "%Y-%m-%d %H:%M:%S",
        ),
        (
            Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("static pattern"),
            "%Y-%m-%d",
        ),
        (
            Regex::new(r"^\d{2}/\d{2}/\d{4}$").expect("static pattern"),
            "%m/%d/%Y",
        ),
    ]
});

/// Characters commonly decorating numbers (currency, grouping, units).
static NUMERIC_NOISE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9.\-]").expect("static pattern"));

/// Rule-based oracle that proposes predictable schemas.
///
/// The rules are intentionally conservative: anything that is not
/// clearly boolean, temporal or numeric stays text, and no partial
/// datetime schemas are ever proposed.
pub struct MockOracle;

impl MockOracle {
    /// Create a new mock oracle.
    pub fn new() -> Self {
        Self
    }

    fn infer_column(name: &str, column: &Column) -> ColumnSchema {
        let cells: Vec<&str> = match column {
            Column::Text(v) | Column::Categorical(v) => v
                .iter()
                .filter_map(|c| c.as_deref())
                .map(str::trim)
                .filter(|s| !s.is_empty() && *s != "-")
                .collect(),
            // Already typed columns keep their type.
            Column::Integer(_) => return ColumnSchema::new(name, DataType::Integer),
            Column::Float(_) => return ColumnSchema::new(name, DataType::Float),
            Column::Boolean(_) => return ColumnSchema::new(name, DataType::Boolean),
            Column::DateTime(_) => return ColumnSchema::new(name, DataType::DateTime),
        };
        if cells.is_empty() {
            return ColumnSchema::new(name, DataType::Text);
        }

        let all = |pred: &dyn Fn(&str) -> bool| cells.iter().all(|v| pred(v));

        if all(&|v| {
            matches!(
                v.to_lowercase().as_str(),
                "true" | "false" | "yes" | "no"
            )
        }) {
            return ColumnSchema::new(name, DataType::Boolean);
        }

        for (pattern, format) in DATETIME_PATTERNS.iter() {
            if all(&|v| pattern.is_match(v)) {
                return ColumnSchema::new(name, DataType::DateTime)
                    .with_datetime_format(*format);
            }
        }

        if all(&|v| v.parse::<i64>().is_ok()) {
            return ColumnSchema::new(name, DataType::Integer);
        }
        if all(&|v| v.parse::<f64>().is_ok()) {
            return ColumnSchema::new(name, DataType::Float);
        }

        // Decorated numbers: strip noise characters and retry.
        let decorated = cells.iter().any(|v| NUMERIC_NOISE.is_match(v));
        if decorated {
            let cleaned: Vec<String> = cells
                .iter()
                .map(|v| NUMERIC_NOISE.replace_all(v, "").into_owned())
                .collect();
            if cleaned.iter().all(|v| !v.is_empty() && v.parse::<i64>().is_ok()) {
                return ColumnSchema::new(name, DataType::Integer)
                    .with_cleaning_pattern(r"[^0-9\-]");
            }
            if cleaned.iter().all(|v| !v.is_empty() && v.parse::<f64>().is_ok()) {
                return ColumnSchema::new(name, DataType::Float)
                    .with_cleaning_pattern(r"[^0-9.\-]");
            }
        }

        ColumnSchema::new(name, DataType::Text)
    }
}

impl Default for MockOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaOracle for MockOracle {
    fn name(&self) -> &str {
        "mock"
    }

    fn propose(
        &self,
        sample: &Frame,
        _feedback: Option<&OracleFeedback>,
    ) -> Result<Vec<ColumnSchema>> {
        Ok(sample
            .iter()
            .map(|(name, column)| Self::infer_column(name, column))
            .collect())
    }
}
