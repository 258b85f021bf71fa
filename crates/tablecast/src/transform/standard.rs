//! Analytical transforms: quantile labeling, aggregation, pivoting,
//! filtering, concatenation, and the composite concentration analysis.

use indexmap::IndexMap;

use crate::error::{Result, TablecastError};
use crate::table::{Column, Frame, Table, Value};

use super::Transform;

/// Group row indices by the combination of values in the key columns,
/// in first-appearance order.
fn group_rows(frame: &Frame, keys: &[String]) -> Result<IndexMap<Vec<Value>, Vec<usize>>> {
    let key_columns: Vec<&Column> = keys
        .iter()
        .map(|key| {
            frame
                .column(key)
                .ok_or_else(|| TablecastError::Validation(format!("column '{}' not found", key)))
        })
        .collect::<Result<_>>()?;

    let mut groups: IndexMap<Vec<Value>, Vec<usize>> = IndexMap::new();
    for row in 0..frame.height() {
        let key: Vec<Value> = key_columns.iter().map(|c| c.get(row)).collect();
        groups.entry(key).or_default().push(row);
    }
    Ok(groups)
}

/// Sum a numeric column over the given rows, skipping nulls.
fn sum_rows(column: &Column, rows: &[usize]) -> Value {
    match column {
        Column::Integer(v) => Value::Int(
            rows.iter()
                .filter_map(|&i| v.get(i).copied().flatten())
                .sum(),
        ),
        Column::Float(v) => Value::Float(
            rows.iter()
                .filter_map(|&i| v.get(i).copied().flatten())
                .sum(),
        ),
        _ => Value::Null,
    }
}

/// Linear-interpolation quantile over sorted values.
fn quantile(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    let h = p * (n - 1) as f64;
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let frac = h - lo as f64;
    sorted[lo] + frac * (sorted[hi] - sorted[lo])
}

/// Labels each row with the quantile bucket its measure value falls
/// into, computed independently per partition group when `partition_by`
/// is non-empty. Boundary values belong to the lower bucket.
pub struct QuantileLabelTransform {
    column: String,
    partition_by: Vec<String>,
    breaks: Vec<f64>,
    labels: Vec<String>,
    alias: String,
}

impl QuantileLabelTransform {
    /// Create the transform, validating the break/label pairing.
    pub fn new(
        column: impl Into<String>,
        partition_by: Vec<String>,
        breaks: Vec<f64>,
        labels: Vec<String>,
        alias: impl Into<String>,
    ) -> Result<Self> {
        if breaks.len() + 1 != labels.len() {
            return Err(TablecastError::Validation(
                "the number of breaks must be one less than the number of quantile labels"
                    .to_string(),
            ));
        }
        for brk in &breaks {
            if !(0.0..=1.0).contains(brk) {
                return Err(TablecastError::Validation(
                    "quantile breaks must be between 0 and 1".to_string(),
                ));
            }
        }
        Ok(Self {
            column: column.into(),
            partition_by,
            breaks,
            labels,
            alias: alias.into(),
        })
    }
}

impl Transform for QuantileLabelTransform {
    fn name(&self) -> &'static str {
        "QuantileLabelTransform"
    }

    fn transform(&self, mut table: Table) -> Result<Table> {
        table.validate_measures(std::slice::from_ref(&self.column))?;
        table.validate_dimensions(&self.partition_by)?;

        let measure = table
            .data
            .column(&self.column)
            .expect("measure validated above");

        let groups: Vec<Vec<usize>> = if self.partition_by.is_empty() {
            vec![(0..table.data.height()).collect()]
        } else {
            group_rows(&table.data, &self.partition_by)?
                .into_values()
                .collect()
        };

        let mut cells: Vec<Option<String>> = vec![None; table.data.height()];
        for rows in groups {
            let mut values: Vec<f64> =
                rows.iter().filter_map(|&i| measure.get_f64(i)).collect();
            if values.is_empty() {
                continue;
            }
            values.sort_by(|a, b| a.total_cmp(b));
            let thresholds: Vec<f64> =
                self.breaks.iter().map(|&p| quantile(&values, p)).collect();
            for &row in &rows {
                if let Some(value) = measure.get_f64(row) {
                    let bucket = thresholds
                        .iter()
                        .position(|&t| value <= t)
                        .unwrap_or(self.breaks.len());
                    cells[row] = Some(self.labels[bucket].clone());
                }
            }
        }

        table
            .data
            .insert(self.alias.clone(), Column::Categorical(cells))?;
        Ok(table)
    }
}

/// Sums numeric columns, optionally grouped by dimension columns.
pub struct SumTransform {
    columns: Vec<String>,
    group_by: Vec<String>,
}

impl SumTransform {
    pub fn new(columns: Vec<String>, group_by: Vec<String>) -> Self {
        Self { columns, group_by }
    }
}

impl Transform for SumTransform {
    fn name(&self) -> &'static str {
        "SumTransform"
    }

    fn transform(&self, mut table: Table) -> Result<Table> {
        table.validate_measures(&self.columns)?;
        table.validate_dimensions(&self.group_by)?;

        let frame = &table.data;
        let all_rows: Vec<usize> = (0..frame.height()).collect();

        let mut columns: Vec<(String, Column)> = Vec::new();
        if self.group_by.is_empty() {
            for name in &self.columns {
                let source = frame.column(name).expect("measure validated above");
                let sum = sum_rows(source, &all_rows);
                columns.push((
                    name.clone(),
                    Column::from_values(source.column_type(), vec![sum])?,
                ));
            }
        } else {
            let groups = group_rows(frame, &self.group_by)?;
            for (position, name) in self.group_by.iter().enumerate() {
                let source = frame.column(name).expect("dimension validated above");
                let keys: Vec<Value> =
                    groups.keys().map(|key| key[position].clone()).collect();
                columns.push((
                    name.clone(),
                    Column::from_values(source.column_type(), keys)?,
                ));
            }
            for name in &self.columns {
                let source = frame.column(name).expect("measure validated above");
                let sums: Vec<Value> = groups
                    .values()
                    .map(|rows| sum_rows(source, rows))
                    .collect();
                columns.push((
                    name.clone(),
                    Column::from_values(source.column_type(), sums)?,
                ));
            }
        }

        table.data = Frame::with_columns(columns)?;
        Ok(table)
    }
}

/// Spreads the distinct values of the `on` columns into new column
/// headers, keeping the `index` columns as row keys.
pub struct PivotTransform {
    on: Vec<String>,
    index: Vec<String>,
    values: Vec<String>,
}

impl PivotTransform {
    pub fn new(on: Vec<String>, index: Vec<String>, values: Vec<String>) -> Self {
        Self { on, index, values }
    }
}

impl Transform for PivotTransform {
    fn name(&self) -> &'static str {
        "PivotTransform"
    }

    fn transform(&self, mut table: Table) -> Result<Table> {
        let dimensions: Vec<String> = self
            .index
            .iter()
            .chain(self.on.iter())
            .cloned()
            .collect();
        table.validate_dimensions(&dimensions)?;
        table.validate_measures(&self.values)?;

        // Datetime headers would carry a time component; shorten them
        // to dates before they become column names.
        let datetime_columns = table.datetime_columns();
        for name in &self.on {
            if !datetime_columns.contains(name) {
                continue;
            }
            let reformatted: Option<Vec<Option<String>>> = match table.data.column(name) {
                Some(Column::DateTime(cells)) => Some(
                    cells
                        .iter()
                        .map(|c| c.map(|dt| dt.format("%Y-%m-%d").to_string()))
                        .collect(),
                ),
                _ => None,
            };
            if let Some(cells) = reformatted {
                table.data.insert(name.clone(), Column::Text(cells))?;
            }
        }

        let frame = &table.data;
        let index_groups = group_rows(frame, &self.index)?;
        let on_groups = group_rows(frame, &self.on)?;

        // First row for each (index, on) combination.
        let mut lookup: IndexMap<(Vec<Value>, Vec<Value>), usize> = IndexMap::new();
        let index_columns: Vec<&Column> = self
            .index
            .iter()
            .map(|n| frame.column(n).expect("dimension validated above"))
            .collect();
        let on_columns: Vec<&Column> = self
            .on
            .iter()
            .map(|n| frame.column(n).expect("dimension validated above"))
            .collect();
        for row in 0..frame.height() {
            let index_key: Vec<Value> = index_columns.iter().map(|c| c.get(row)).collect();
            let on_key: Vec<Value> = on_columns.iter().map(|c| c.get(row)).collect();
            lookup.entry((index_key, on_key)).or_insert(row);
        }

        let mut columns: Vec<(String, Column)> = Vec::new();
        for (position, name) in self.index.iter().enumerate() {
            let source = frame.column(name).expect("dimension validated above");
            let keys: Vec<Value> = index_groups
                .keys()
                .map(|key| key[position].clone())
                .collect();
            columns.push((
                name.clone(),
                Column::from_values(source.column_type(), keys)?,
            ));
        }

        for on_key in on_groups.keys() {
            let header = on_key
                .iter()
                .map(|v| v.render())
                .collect::<Vec<_>>()
                .join("_");
            for value_name in &self.values {
                let source = frame.column(value_name).expect("measure validated above");
                let cells: Vec<Value> = index_groups
                    .keys()
                    .map(|index_key| {
                        lookup
                            .get(&(index_key.clone(), on_key.clone()))
                            .map(|&row| source.get(row))
                            .unwrap_or(Value::Null)
                    })
                    .collect();
                let column_name = if self.values.len() == 1 {
                    header.clone()
                } else {
                    format!("{}_{}", value_name, header)
                };
                columns.push((
                    column_name,
                    Column::from_values(source.column_type(), cells)?,
                ));
            }
        }

        table.data = Frame::with_columns(columns)?;
        Ok(table)
    }
}

/// Keeps rows whose cell in `column` is a member of `values`.
pub struct FilterTransform {
    column: String,
    values: Vec<Value>,
}

impl FilterTransform {
    pub fn new(column: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            column: column.into(),
            values,
        }
    }
}

impl Transform for FilterTransform {
    fn name(&self) -> &'static str {
        "FilterTransform"
    }

    fn transform(&self, mut table: Table) -> Result<Table> {
        table.validate_columns(std::slice::from_ref(&self.column))?;
        let source = table
            .data
            .column(&self.column)
            .expect("presence validated above");
        let keep: Vec<usize> = (0..table.data.height())
            .filter(|&row| {
                let cell = source.get(row);
                self.values.iter().any(|v| v.matches(&cell))
            })
            .collect();
        table.data = table.data.take_rows(&keep);
        Ok(table)
    }
}

/// Appends the rows of a second table below this one ("diagonal"
/// concatenation): columns are unioned, one-sided columns null-filled,
/// and compatible dtypes widened.
pub struct VerticalConcatenateTransform {
    other: Table,
}

impl VerticalConcatenateTransform {
    pub fn new(other: Table) -> Self {
        Self { other }
    }
}

impl Transform for VerticalConcatenateTransform {
    fn name(&self) -> &'static str {
        "VerticalConcatenateTransform"
    }

    fn transform(&self, mut table: Table) -> Result<Table> {
        let top_height = table.data.height();
        let bottom_height = self.other.data.height();

        let mut names = table.data.column_names();
        for name in self.other.data.column_names() {
            if !names.contains(&name) {
                names.push(name);
            }
        }

        let mut columns = Vec::with_capacity(names.len());
        for name in names {
            let combined = match (table.data.column(&name), self.other.data.column(&name)) {
                (Some(top), Some(bottom)) => concat_columns(top, bottom, &name)?,
                (Some(top), None) => {
                    concat_columns(top, &Column::nulls(top.column_type(), bottom_height), &name)?
                }
                (None, Some(bottom)) => concat_columns(
                    &Column::nulls(bottom.column_type(), top_height),
                    bottom,
                    &name,
                )?,
                (None, None) => unreachable!("name came from one of the two tables"),
            };
            columns.push((name, combined));
        }

        table.data = Frame::with_columns(columns)?;
        Ok(table)
    }
}

/// Concatenate two columns, widening compatible types (integer+float to
/// float, categorical+text to text).
fn concat_columns(top: &Column, bottom: &Column, name: &str) -> Result<Column> {
    fn join<T: Clone>(a: &[Option<T>], b: &[Option<T>]) -> Vec<Option<T>> {
        a.iter().cloned().chain(b.iter().cloned()).collect()
    }
    fn to_float(cells: &[Option<i64>]) -> Vec<Option<f64>> {
        cells.iter().map(|c| c.map(|n| n as f64)).collect()
    }

    match (top, bottom) {
        (Column::Text(a), Column::Text(b)) => Ok(Column::Text(join(a, b))),
        (Column::Categorical(a), Column::Categorical(b)) => Ok(Column::Categorical(join(a, b))),
        (Column::Integer(a), Column::Integer(b)) => Ok(Column::Integer(join(a, b))),
        (Column::Float(a), Column::Float(b)) => Ok(Column::Float(join(a, b))),
        (Column::Boolean(a), Column::Boolean(b)) => Ok(Column::Boolean(join(a, b))),
        (Column::DateTime(a), Column::DateTime(b)) => Ok(Column::DateTime(join(a, b))),
        (Column::Integer(a), Column::Float(b)) => Ok(Column::Float(join(&to_float(a), b))),
        (Column::Float(a), Column::Integer(b)) => Ok(Column::Float(join(a, &to_float(b)))),
        (Column::Text(a), Column::Categorical(b)) | (Column::Categorical(a), Column::Text(b)) => {
            Ok(Column::Text(join(a, b)))
        }
        (a, b) => Err(TablecastError::Validation(format!(
            "cannot concatenate column '{}' of type {:?} with type {:?}",
            name,
            a.column_type(),
            b.column_type()
        ))),
    }
}

/// Pareto-style contribution breakdown: for each configured break, the
/// share of the measure contributed by the top fraction of rows within
/// each partition, plus a grand-total row.
pub struct ConcentrationAnalysisTransform {
    on: String,
    by: Vec<String>,
    labels: Vec<String>,
    breaks: Vec<f64>,
    output_column: String,
}

impl ConcentrationAnalysisTransform {
    /// Create the analysis with the default buckets
    /// (top 50% / 20% / 10%).
    pub fn new(on: impl Into<String>, by: Vec<String>) -> Self {
        Self {
            on: on.into(),
            by,
            labels: vec![
                "Top 50%".to_string(),
                "Top 20%".to_string(),
                "Top 10%".to_string(),
            ],
            breaks: vec![0.5, 0.8, 0.9],
            output_column: "Concentration".to_string(),
        }
    }

    /// Override the break points and their labels (paired positionally).
    pub fn with_buckets(mut self, breaks: Vec<f64>, labels: Vec<String>) -> Self {
        self.breaks = breaks;
        self.labels = labels;
        self
    }

    /// Override the name of the label column in the output.
    pub fn with_output_column(mut self, name: impl Into<String>) -> Self {
        self.output_column = name.into();
        self
    }
}

impl Transform for ConcentrationAnalysisTransform {
    fn name(&self) -> &'static str {
        "ConcentrationAnalysisTransform"
    }

    fn transform(&self, table: Table) -> Result<Table> {
        table.validate_measures(std::slice::from_ref(&self.on))?;
        table.validate_dimensions(&self.by)?;

        let mut pieces: Vec<Table> = Vec::new();
        for (brk, label) in self.breaks.iter().zip(&self.labels) {
            let quantile = QuantileLabelTransform::new(
                self.on.clone(),
                self.by.clone(),
                vec![*brk],
                vec!["Below".to_string(), label.clone()],
                self.output_column.clone(),
            )?;
            let mut piece = quantile.apply(&table)?;
            piece = FilterTransform::new(
                self.output_column.clone(),
                vec![Value::Text(label.clone())],
            )
            .apply(&piece)?;
            let mut group_by = self.by.clone();
            group_by.push(self.output_column.clone());
            piece = SumTransform::new(vec![self.on.clone()], group_by).apply(&piece)?;
            piece = PivotTransform::new(
                self.by.clone(),
                vec![self.output_column.clone()],
                vec![self.on.clone()],
            )
            .apply(&piece)?;
            pieces.push(piece);
        }

        if pieces.is_empty() {
            return Ok(table);
        }

        // Unconstrained grand total, tagged and pivoted the same way.
        let mut total =
            SumTransform::new(vec![self.on.clone()], self.by.clone()).apply(&table)?;
        total.data.insert(
            self.output_column.clone(),
            Column::Text(vec![Some("Total".to_string()); total.data.height()]),
        )?;
        let total = PivotTransform::new(
            self.by.clone(),
            vec![self.output_column.clone()],
            vec![self.on.clone()],
        )
        .apply(&total)?;
        pieces.push(total);

        let mut result = pieces.remove(0);
        for piece in pieces {
            result = VerticalConcatenateTransform::new(piece).apply(&result)?;
        }

        // Final ordering is the lexical sort of the literal label text.
        let label_column = result
            .data
            .column(&self.output_column)
            .ok_or_else(|| {
                TablecastError::Validation(format!(
                    "column '{}' not found after concentration analysis",
                    self.output_column
                ))
            })?;
        let sort_keys: Vec<Value> = (0..result.data.height())
            .map(|row| label_column.get(row))
            .collect();
        let mut order: Vec<usize> = (0..result.data.height()).collect();
        order.sort_by(|&a, &b| match (&sort_keys[a], &sort_keys[b]) {
            (Value::Text(x), Value::Text(y)) => x.cmp(y),
            (Value::Null, Value::Null) => std::cmp::Ordering::Equal,
            (Value::Null, _) => std::cmp::Ordering::Less,
            (_, Value::Null) => std::cmp::Ordering::Greater,
            (x, y) => x.render().cmp(&y.render()),
        });
        result.data = result.data.take_rows(&order);
        Ok(result)
    }
}
