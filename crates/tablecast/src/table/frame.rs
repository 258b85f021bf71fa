//! Column-major typed storage for tabular data.

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TablecastError};

/// Storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Free text values.
    Text,
    /// Low-cardinality label values.
    Categorical,
    /// Whole numbers.
    Integer,
    /// Floating-point numbers.
    Float,
    /// Boolean values.
    Boolean,
    /// Date and time values.
    DateTime,
}

impl ColumnType {
    /// Returns true if this type is numeric (a measure).
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }

    /// Returns true if this type is temporal.
    pub fn is_temporal(&self) -> bool {
        matches!(self, ColumnType::DateTime)
    }

    /// Returns true if this type can be grouped or pivoted on.
    pub fn is_dimension(&self) -> bool {
        matches!(
            self,
            ColumnType::Text | ColumnType::Categorical | ColumnType::DateTime
        )
    }
}

/// An owned scalar cell value.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl Value {
    /// Returns true for the null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Membership comparison used by filters: integers and floats
    /// compare numerically, everything else structurally.
    pub fn matches(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                *a as f64 == *b
            }
            _ => self == other,
        }
    }

    /// Render the value for use in a column header.
    pub fn render(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Text(s) => s.clone(),
            Value::Int(n) => n.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    /// Convert to a JSON value for the serialization boundary.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Int(n) => serde_json::Value::from(*n),
            Value::Float(f) => serde_json::Value::from(*f),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::DateTime(dt) => {
                serde_json::Value::String(dt.format("%Y-%m-%dT%H:%M:%S").to_string())
            }
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            // Bit equality keeps Eq and Hash consistent for floats.
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            Value::Null => 0u8.hash(state),
            Value::Text(s) => {
                1u8.hash(state);
                s.hash(state);
            }
            Value::Int(n) => {
                2u8.hash(state);
                n.hash(state);
            }
            Value::Float(f) => {
                3u8.hash(state);
                f.to_bits().hash(state);
            }
            Value::Bool(b) => {
                4u8.hash(state);
                b.hash(state);
            }
            Value::DateTime(dt) => {
                5u8.hash(state);
                dt.hash(state);
            }
        }
    }
}

/// A single typed column; nulls are represented as `None`.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Text(Vec<Option<String>>),
    Categorical(Vec<Option<String>>),
    Integer(Vec<Option<i64>>),
    Float(Vec<Option<f64>>),
    Boolean(Vec<Option<bool>>),
    DateTime(Vec<Option<NaiveDateTime>>),
}

impl Column {
    /// The storage type tag of this column.
    pub fn column_type(&self) -> ColumnType {
        match self {
            Column::Text(_) => ColumnType::Text,
            Column::Categorical(_) => ColumnType::Categorical,
            Column::Integer(_) => ColumnType::Integer,
            Column::Float(_) => ColumnType::Float,
            Column::Boolean(_) => ColumnType::Boolean,
            Column::DateTime(_) => ColumnType::DateTime,
        }
    }

    /// Number of cells (including nulls).
    pub fn len(&self) -> usize {
        match self {
            Column::Text(v) | Column::Categorical(v) => v.len(),
            Column::Integer(v) => v.len(),
            Column::Float(v) => v.len(),
            Column::Boolean(v) => v.len(),
            Column::DateTime(v) => v.len(),
        }
    }

    /// Returns true when the column has no cells.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the cell at `index` as an owned scalar.
    pub fn get(&self, index: usize) -> Value {
        match self {
            Column::Text(v) | Column::Categorical(v) => v
                .get(index)
                .and_then(|c| c.as_ref())
                .map(|s| Value::Text(s.clone()))
                .unwrap_or(Value::Null),
            Column::Integer(v) => v
                .get(index)
                .and_then(|c| *c)
                .map(Value::Int)
                .unwrap_or(Value::Null),
            Column::Float(v) => v
                .get(index)
                .and_then(|c| *c)
                .map(Value::Float)
                .unwrap_or(Value::Null),
            Column::Boolean(v) => v
                .get(index)
                .and_then(|c| *c)
                .map(Value::Bool)
                .unwrap_or(Value::Null),
            Column::DateTime(v) => v
                .get(index)
                .and_then(|c| *c)
                .map(Value::DateTime)
                .unwrap_or(Value::Null),
        }
    }

    /// Numeric view of a cell; `None` for nulls and non-numeric columns.
    pub fn get_f64(&self, index: usize) -> Option<f64> {
        match self {
            Column::Integer(v) => v.get(index).and_then(|c| *c).map(|n| n as f64),
            Column::Float(v) => v.get(index).and_then(|c| *c),
            _ => None,
        }
    }

    /// Number of non-null cells.
    pub fn non_null_count(&self) -> usize {
        match self {
            Column::Text(v) | Column::Categorical(v) => v.iter().filter(|c| c.is_some()).count(),
            Column::Integer(v) => v.iter().filter(|c| c.is_some()).count(),
            Column::Float(v) => v.iter().filter(|c| c.is_some()).count(),
            Column::Boolean(v) => v.iter().filter(|c| c.is_some()).count(),
            Column::DateTime(v) => v.iter().filter(|c| c.is_some()).count(),
        }
    }

    /// A column of `len` nulls with the given type.
    pub fn nulls(column_type: ColumnType, len: usize) -> Column {
        match column_type {
            ColumnType::Text => Column::Text(vec![None; len]),
            ColumnType::Categorical => Column::Categorical(vec![None; len]),
            ColumnType::Integer => Column::Integer(vec![None; len]),
            ColumnType::Float => Column::Float(vec![None; len]),
            ColumnType::Boolean => Column::Boolean(vec![None; len]),
            ColumnType::DateTime => Column::DateTime(vec![None; len]),
        }
    }

    /// Rebuild a column of the given type from owned scalar values.
    ///
    /// Integers widen into float columns; any other type mismatch is an
    /// error naming the offending value.
    pub fn from_values(column_type: ColumnType, values: Vec<Value>) -> Result<Column> {
        fn bad(column_type: ColumnType, value: &Value) -> TablecastError {
            TablecastError::Validation(format!(
                "value {:?} does not fit column type {:?}",
                value, column_type
            ))
        }

        match column_type {
            ColumnType::Text | ColumnType::Categorical => {
                let mut cells = Vec::with_capacity(values.len());
                for value in &values {
                    cells.push(match value {
                        Value::Null => None,
                        Value::Text(s) => Some(s.clone()),
                        other => return Err(bad(column_type, other)),
                    });
                }
                Ok(if column_type == ColumnType::Text {
                    Column::Text(cells)
                } else {
                    Column::Categorical(cells)
                })
            }
            ColumnType::Integer => {
                let mut cells = Vec::with_capacity(values.len());
                for value in &values {
                    cells.push(match value {
                        Value::Null => None,
                        Value::Int(n) => Some(*n),
                        other => return Err(bad(column_type, other)),
                    });
                }
                Ok(Column::Integer(cells))
            }
            ColumnType::Float => {
                let mut cells = Vec::with_capacity(values.len());
                for value in &values {
                    cells.push(match value {
                        Value::Null => None,
                        Value::Float(f) => Some(*f),
                        Value::Int(n) => Some(*n as f64),
                        other => return Err(bad(column_type, other)),
                    });
                }
                Ok(Column::Float(cells))
            }
            ColumnType::Boolean => {
                let mut cells = Vec::with_capacity(values.len());
                for value in &values {
                    cells.push(match value {
                        Value::Null => None,
                        Value::Bool(b) => Some(*b),
                        other => return Err(bad(column_type, other)),
                    });
                }
                Ok(Column::Boolean(cells))
            }
            ColumnType::DateTime => {
                let mut cells = Vec::with_capacity(values.len());
                for value in &values {
                    cells.push(match value {
                        Value::Null => None,
                        Value::DateTime(dt) => Some(*dt),
                        other => return Err(bad(column_type, other)),
                    });
                }
                Ok(Column::DateTime(cells))
            }
        }
    }

    /// Keep only the cells at `indices`, in the given order.
    pub fn take(&self, indices: &[usize]) -> Column {
        fn pick<T: Clone>(cells: &[Option<T>], indices: &[usize]) -> Vec<Option<T>> {
            indices
                .iter()
                .map(|&i| cells.get(i).cloned().flatten())
                .collect()
        }

        match self {
            Column::Text(v) => Column::Text(pick(v, indices)),
            Column::Categorical(v) => Column::Categorical(pick(v, indices)),
            Column::Integer(v) => Column::Integer(pick(v, indices)),
            Column::Float(v) => Column::Float(pick(v, indices)),
            Column::Boolean(v) => Column::Boolean(pick(v, indices)),
            Column::DateTime(v) => Column::DateTime(pick(v, indices)),
        }
    }
}

/// Ordered collection of equally sized, uniquely named columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    columns: IndexMap<String, Column>,
}

impl Frame {
    /// Create an empty frame.
    pub fn new() -> Self {
        Self {
            columns: IndexMap::new(),
        }
    }

    /// Create a frame from named columns, validating the invariants:
    /// unique names and a single shared length.
    pub fn with_columns(columns: Vec<(String, Column)>) -> Result<Self> {
        let mut frame = Frame::new();
        for (name, column) in columns {
            if frame.columns.contains_key(&name) {
                return Err(TablecastError::Validation(format!(
                    "duplicate column name '{}'",
                    name
                )));
            }
            frame.insert(name, column)?;
        }
        Ok(frame)
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.columns.values().next().map(|c| c.len()).unwrap_or(0)
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Shape as (rows, columns).
    pub fn shape(&self) -> (usize, usize) {
        (self.height(), self.width())
    }

    /// Returns true when the frame has no rows or no columns.
    pub fn is_empty(&self) -> bool {
        self.height() == 0 || self.width() == 0
    }

    /// Column names in frame order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.keys().cloned().collect()
    }

    /// Returns true if a column with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    /// Iterate over (name, column) pairs in frame order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Column)> {
        self.columns.iter()
    }

    /// Insert a column, replacing an existing column of the same name.
    /// The length must match the frame height (unless the frame has no
    /// columns yet).
    pub fn insert(&mut self, name: impl Into<String>, column: Column) -> Result<()> {
        let name = name.into();
        let replacing = self.columns.contains_key(&name);
        let reference = if replacing {
            self.width() > 1
        } else {
            self.width() > 0
        };
        if reference && column.len() != self.height_excluding(&name) {
            return Err(TablecastError::Validation(format!(
                "column '{}' has length {} but the table has {} row(s)",
                name,
                column.len(),
                self.height_excluding(&name)
            )));
        }
        self.columns.insert(name, column);
        Ok(())
    }

    fn height_excluding(&self, name: &str) -> usize {
        self.columns
            .iter()
            .find(|(n, _)| n.as_str() != name)
            .map(|(_, c)| c.len())
            .unwrap_or(0)
    }

    /// Remove a column by name; absent names are ignored.
    pub fn drop_column(&mut self, name: &str) {
        self.columns.shift_remove(name);
    }

    /// Project the frame onto the named columns, in the given order.
    pub fn select(&self, names: &[String]) -> Result<Frame> {
        let mut columns = Vec::with_capacity(names.len());
        for name in names {
            let column = self.columns.get(name).ok_or_else(|| {
                TablecastError::Validation(format!("column '{}' not found", name))
            })?;
            columns.push((name.clone(), column.clone()));
        }
        Frame::with_columns(columns)
    }

    /// Keep only the rows at `indices`, in the given order.
    pub fn take_rows(&self, indices: &[usize]) -> Frame {
        let columns = self
            .columns
            .iter()
            .map(|(name, column)| (name.clone(), column.take(indices)))
            .collect();
        Frame { columns }
    }

    /// Render a row slice as JSON maps, one per row.
    pub fn to_records(
        &self,
        offset: usize,
        limit: usize,
    ) -> Vec<serde_json::Map<String, serde_json::Value>> {
        let end = (offset + limit).min(self.height());
        (offset..end)
            .map(|row| {
                self.columns
                    .iter()
                    .map(|(name, column)| (name.clone(), column.get(row).to_json()))
                    .collect()
            })
            .collect()
    }
}
