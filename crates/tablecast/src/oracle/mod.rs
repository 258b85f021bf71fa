//! Schema inference oracle: an external service proposes column schemas
//! from a data sample; the driver here validates every proposal by
//! dry-running the formatting transforms and feeds failures back for a
//! bounded number of retries.

use std::collections::HashSet;

use tracing::{info, warn};

use crate::error::{Result, TablecastError};
use crate::schema::ColumnSchema;
use crate::table::{Frame, Table, TableSource};
use crate::transform::{ColumnSchemaTransform, FusePartialDatetimeColumnsTransform, Transform};

pub mod anthropic;
pub mod mock;
pub mod prompts;

pub use anthropic::{AnthropicOracle, OracleConfig};
pub use mock::MockOracle;

/// Default retry budget for schema inference.
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;

/// Typed retry signal: which column failed validation and why.
#[derive(Debug, Clone)]
pub struct OracleFeedback {
    /// Column whose proposed schema failed.
    pub column: String,
    /// Failure description fed back to the oracle.
    pub reason: String,
}

/// A service that proposes column schemas for a data sample.
///
/// Implementations must be thread-safe (Send + Sync) so a single oracle
/// can serve concurrent load requests.
pub trait SchemaOracle: Send + Sync {
    /// Name of the oracle (for logging/debugging).
    fn name(&self) -> &str;

    /// Propose a schema covering every column of the sample. When a
    /// previous proposal failed validation, the failure is passed back
    /// so the oracle can correct it.
    fn propose(
        &self,
        sample: &Frame,
        feedback: Option<&OracleFeedback>,
    ) -> Result<Vec<ColumnSchema>>;
}

/// Run the oracle until it produces a proposal that survives a dry run
/// of the formatting transforms, up to `max_attempts` times.
pub fn infer_schema(
    oracle: &dyn SchemaOracle,
    sample: &Frame,
    max_attempts: usize,
) -> Result<Vec<ColumnSchema>> {
    let mut feedback: Option<OracleFeedback> = None;
    for attempt in 1..=max_attempts {
        let schemas = oracle.propose(sample, feedback.as_ref())?;
        match validate_proposal(sample, &schemas) {
            Ok(()) => {
                info!(
                    oracle = oracle.name(),
                    attempt,
                    columns = schemas.len(),
                    "schema proposal accepted"
                );
                return Ok(schemas);
            }
            Err(failure) => {
                warn!(
                    oracle = oracle.name(),
                    attempt,
                    column = %failure.column,
                    reason = %failure.reason,
                    "schema proposal rejected"
                );
                feedback = Some(failure);
            }
        }
    }
    let message = feedback
        .map(|f| format!("column '{}': {}", f.column, f.reason))
        .unwrap_or_else(|| "no proposal produced".to_string());
    Err(TablecastError::Oracle {
        attempts: max_attempts,
        message,
    })
}

/// Dry-run the formatting transforms against the sample: every column
/// must be covered, every per-column schema must parse, and any partial
/// datetime columns must fuse.
fn validate_proposal(
    sample: &Frame,
    schemas: &[ColumnSchema],
) -> std::result::Result<(), OracleFeedback> {
    let proposed: HashSet<&str> = schemas.iter().map(|s| s.name.as_str()).collect();
    for column in sample.column_names() {
        if !proposed.contains(column.as_str()) {
            return Err(OracleFeedback {
                column,
                reason: "no schema proposed for this column".to_string(),
            });
        }
    }

    let table = Table::new("sample", TableSource::Other, sample.clone());
    for schema in schemas {
        let outcome = ColumnSchemaTransform::new(vec![schema.clone()])
            .and_then(|transform| transform.apply(&table));
        if let Err(e) = outcome {
            return Err(OracleFeedback {
                column: schema.name.clone(),
                reason: e.to_string(),
            });
        }
    }

    if let Err(e) = FusePartialDatetimeColumnsTransform::new(schemas.to_vec()).apply(&table) {
        let column = match &e {
            TablecastError::Parse { column, .. } => column.clone(),
            _ => schemas
                .iter()
                .find(|s| s.partial_datetime_schema.is_some())
                .map(|s| s.name.clone())
                .unwrap_or_default(),
        };
        return Err(OracleFeedback {
            column,
            reason: e.to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DataType, DatetimePart};
    use crate::table::Column;

    fn sample() -> Frame {
        Frame::with_columns(vec![
            (
                "id".to_string(),
                Column::Text(vec![Some("1".into()), Some("2".into())]),
            ),
            (
                "label".to_string(),
                Column::Text(vec![Some("a".into()), Some("b".into())]),
            ),
        ])
        .unwrap()
    }

    /// Oracle that serves scripted proposals in order.
    struct Scripted {
        proposals: std::sync::Mutex<Vec<Vec<ColumnSchema>>>,
        feedback_seen: std::sync::Mutex<Vec<Option<String>>>,
    }

    impl Scripted {
        fn new(proposals: Vec<Vec<ColumnSchema>>) -> Self {
            Self {
                proposals: std::sync::Mutex::new(proposals),
                feedback_seen: std::sync::Mutex::new(Vec::new()),
            }
        }
    }

    impl SchemaOracle for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        fn propose(
            &self,
            _sample: &Frame,
            feedback: Option<&OracleFeedback>,
        ) -> Result<Vec<ColumnSchema>> {
            self.feedback_seen
                .lock()
                .unwrap()
                .push(feedback.map(|f| f.column.clone()));
            let mut proposals = self.proposals.lock().unwrap();
            if proposals.is_empty() {
                return Err(TablecastError::Config("script exhausted".to_string()));
            }
            Ok(proposals.remove(0))
        }
    }

    fn good_proposal() -> Vec<ColumnSchema> {
        vec![
            ColumnSchema::new("id", DataType::Integer),
            ColumnSchema::new("label", DataType::Text),
        ]
    }

    #[test]
    fn test_accepts_valid_proposal() {
        let oracle = Scripted::new(vec![good_proposal()]);
        let schemas = infer_schema(&oracle, &sample(), 3).unwrap();
        assert_eq!(schemas.len(), 2);
    }

    #[test]
    fn test_retries_with_feedback_then_succeeds() {
        // First proposal types "label" as integer, which the dry run
        // rejects; the second corrects it.
        let bad = vec![
            ColumnSchema::new("id", DataType::Integer),
            ColumnSchema::new("label", DataType::Integer),
        ];
        let oracle = Scripted::new(vec![bad, good_proposal()]);
        let schemas = infer_schema(&oracle, &sample(), 3).unwrap();
        assert_eq!(schemas[1].data_type, DataType::Text);

        let seen = oracle.feedback_seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], None);
        assert_eq!(seen[1], Some("label".to_string()));
    }

    #[test]
    fn test_exhausted_retries_fail_permanently() {
        let bad = || vec![ColumnSchema::new("id", DataType::Integer)];
        let oracle = Scripted::new(vec![bad(), bad(), bad()]);
        let err = infer_schema(&oracle, &sample(), 3).unwrap_err();
        match err {
            TablecastError::Oracle { attempts, message } => {
                assert_eq!(attempts, 3);
                assert!(message.contains("label"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_year_part_rejected() {
        let proposal = vec![
            ColumnSchema::new("id", DataType::Integer)
                .with_datetime_part(DatetimePart::Month, "when"),
            ColumnSchema::new("label", DataType::Text),
        ];
        let oracle = Scripted::new(vec![proposal]);
        let err = infer_schema(&oracle, &sample(), 1).unwrap_err();
        assert!(err.to_string().contains("year"));
    }
}
