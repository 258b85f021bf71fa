//! Transform framework: table-to-table operations with shared
//! precondition and copy-on-apply semantics.

use tracing::debug;

use crate::error::{Result, TablecastError};
use crate::table::Table;

pub mod formatting;
pub mod standard;

pub use formatting::{
    ColumnSchemaTransform, DefaultColumnSortingTransform, FusePartialDatetimeColumnsTransform,
    StringToCategoricalTransform,
};
pub use standard::{
    ConcentrationAnalysisTransform, FilterTransform, PivotTransform, QuantileLabelTransform,
    SumTransform, VerticalConcatenateTransform,
};

/// A table-to-table operation, configured once, applied many times.
///
/// `apply` is the shared entrypoint: it rejects empty tables, logs the
/// application, and hands a deep copy of the input to the
/// transform-specific `transform`. The input table is never mutated, so
/// concurrent callers holding the same table can each apply transforms
/// without observing the other's effect.
pub trait Transform {
    /// Name of the transform, for logs and errors.
    fn name(&self) -> &'static str;

    /// Transform-specific logic. Receives an owned copy of the input.
    fn transform(&self, table: Table) -> Result<Table>;

    /// Apply the transform to a table, producing a fresh table.
    fn apply(&self, table: &Table) -> Result<Table> {
        if table.data.is_empty() {
            return Err(TablecastError::EmptyData(
                "cannot transform empty table".to_string(),
            ));
        }
        debug!(transform = self.name(), table = %table.name, "applying transform");
        self.transform(table.clone())
    }
}

/// Apply an ordered chain of transforms left to right.
pub fn apply_chain(transforms: &[Box<dyn Transform>], table: &Table) -> Result<Table> {
    let mut current = table.clone();
    for transform in transforms {
        current = transform.apply(&current)?;
    }
    Ok(current)
}
