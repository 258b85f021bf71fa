//! Formatting transforms: schema application, datetime-part fusion,
//! categorical demotion and canonical column ordering.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;
use regex::Regex;

use crate::error::{Result, TablecastError};
use crate::schema::{ColumnSchema, DataType, DatetimePart};
use crate::table::{Column, Frame, Table};

use super::Transform;

/// Formats tried when a datetime column carries no explicit format.
const FALLBACK_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%d.%m.%Y",
];

/// Applies a list of column schemas to a raw (text) table: cleans,
/// casts, and projects onto exactly the scheduled columns in schema
/// order.
pub struct ColumnSchemaTransform {
    schemas: Vec<ColumnSchema>,
    patterns: Vec<Option<Regex>>,
}

impl ColumnSchemaTransform {
    /// Create the transform, compiling every non-empty cleaning pattern.
    pub fn new(schemas: Vec<ColumnSchema>) -> Result<Self> {
        let patterns = schemas
            .iter()
            .map(|schema| {
                if schema.regex_cleaning_pattern.is_empty() {
                    Ok(None)
                } else {
                    Regex::new(&schema.regex_cleaning_pattern).map(Some)
                }
            })
            .collect::<std::result::Result<Vec<_>, regex::Error>>()?;
        Ok(Self { schemas, patterns })
    }
}

impl Transform for ColumnSchemaTransform {
    fn name(&self) -> &'static str {
        "ColumnSchemaTransform"
    }

    fn transform(&self, mut table: Table) -> Result<Table> {
        let available = table.data.column_names();
        let missing: Vec<&str> = self
            .schemas
            .iter()
            .map(|s| s.name.as_str())
            .filter(|name| !available.iter().any(|a| a == name))
            .collect();
        if !missing.is_empty() {
            return Err(TablecastError::Validation(format!(
                "column(s) {:?} not in table '{}'",
                missing, table.name
            )));
        }

        let mut columns = Vec::with_capacity(self.schemas.len());
        for (schema, pattern) in self.schemas.iter().zip(&self.patterns) {
            let source = table
                .data
                .column(&schema.name)
                .expect("presence checked above");
            let cells = match source {
                Column::Text(v) | Column::Categorical(v) => v,
                other => {
                    return Err(TablecastError::parse(
                        &schema.name,
                        format!(
                            "schema application expects a text column, found {:?}",
                            other.column_type()
                        ),
                    ));
                }
            };
            let parsed = parse_cells(cells, schema, pattern.as_ref())?;
            columns.push((schema.name.clone(), parsed));
        }

        table.data = Frame::with_columns(columns)?;
        Ok(table)
    }
}

/// Parse one column's cells according to its schema.
fn parse_cells(
    cells: &[Option<String>],
    schema: &ColumnSchema,
    pattern: Option<&Regex>,
) -> Result<Column> {
    let column = schema.name.as_str();
    match schema.data_type {
        DataType::Text => {
            let parsed = cells
                .iter()
                .map(|cell| {
                    cell.as_ref()
                        .map(|raw| clean(raw.trim(), pattern))
                })
                .collect();
            Ok(Column::Text(parsed))
        }
        DataType::Integer => {
            let mut parsed = Vec::with_capacity(cells.len());
            for cell in cells {
                parsed.push(match cell {
                    None => None,
                    Some(raw) => {
                        let cleaned = clean(raw.trim(), pattern);
                        if cleaned.is_empty() || cleaned == "-" {
                            None
                        } else {
                            Some(cleaned.parse::<i64>().map_err(|e| {
                                TablecastError::parse(
                                    column,
                                    format!("cannot cast '{}' to integer: {}", raw, e),
                                )
                            })?)
                        }
                    }
                });
            }
            Ok(Column::Integer(parsed))
        }
        DataType::Float => {
            let mut parsed = Vec::with_capacity(cells.len());
            for cell in cells {
                parsed.push(match cell {
                    None => None,
                    Some(raw) => {
                        let cleaned = clean(raw.trim(), pattern);
                        if cleaned.is_empty() || cleaned == "-" {
                            None
                        } else {
                            Some(cleaned.parse::<f64>().map_err(|e| {
                                TablecastError::parse(
                                    column,
                                    format!("cannot cast '{}' to float: {}", raw, e),
                                )
                            })?)
                        }
                    }
                });
            }
            Ok(Column::Float(parsed))
        }
        DataType::Boolean => {
            let mut parsed = Vec::with_capacity(cells.len());
            for cell in cells {
                parsed.push(match cell {
                    None => None,
                    Some(raw) => {
                        let cleaned = clean(&raw.trim().to_lowercase(), pattern);
                        match cleaned.as_str() {
                            "" | "-" => None,
                            "yes" | "true" => Some(true),
                            "no" | "false" => Some(false),
                            other => Some(
                                other
                                    .parse::<i64>()
                                    .map(|n| n != 0)
                                    .map_err(|_| {
                                        TablecastError::parse(
                                            column,
                                            format!("cannot cast '{}' to boolean", raw),
                                        )
                                    })?,
                            ),
                        }
                    }
                });
            }
            Ok(Column::Boolean(parsed))
        }
        DataType::DateTime => {
            let mut parsed = Vec::with_capacity(cells.len());
            for cell in cells {
                parsed.push(match cell {
                    None => None,
                    Some(raw) => Some(parse_datetime(raw.trim(), schema.datetime_format.as_deref())
                        .ok_or_else(|| {
                            TablecastError::parse(
                                column,
                                match &schema.datetime_format {
                                    Some(fmt) => format!(
                                        "cannot parse '{}' with datetime format '{}'",
                                        raw, fmt
                                    ),
                                    None => format!("cannot parse '{}' as a datetime", raw),
                                },
                            )
                        })?),
                });
            }
            Ok(Column::DateTime(parsed))
        }
    }
}

/// Remove characters matching the cleaning pattern.
fn clean(value: &str, pattern: Option<&Regex>) -> String {
    match pattern {
        Some(re) => re.replace_all(value, "").into_owned(),
        None => value.to_string(),
    }
}

/// Parse a datetime string with the given format, or the fallback list
/// when no format is supplied. Date-only formats resolve to midnight.
fn parse_datetime(value: &str, format: Option<&str>) -> Option<NaiveDateTime> {
    let parse_one = |fmt: &str| {
        NaiveDateTime::parse_from_str(value, fmt)
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(value, fmt)
                    .ok()
                    .map(|d| d.and_time(NaiveTime::MIN))
            })
    };
    match format {
        Some(fmt) => parse_one(fmt),
        None => FALLBACK_DATETIME_FORMATS.iter().find_map(|fmt| parse_one(fmt)),
    }
}

/// Fuses columns holding datetime parts (year, month, ...) into one
/// composite datetime column per parent name, dropping the parts.
pub struct FusePartialDatetimeColumnsTransform {
    schemas: Vec<ColumnSchema>,
}

impl FusePartialDatetimeColumnsTransform {
    pub fn new(schemas: Vec<ColumnSchema>) -> Self {
        Self { schemas }
    }
}

impl Transform for FusePartialDatetimeColumnsTransform {
    fn name(&self) -> &'static str {
        "FusePartialDatetimeColumnsTransform"
    }

    fn transform(&self, mut table: Table) -> Result<Table> {
        // Group part columns by the composite column they belong to.
        let mut groups: IndexMap<String, IndexMap<DatetimePart, String>> = IndexMap::new();
        for schema in &self.schemas {
            if let Some(partial) = &schema.partial_datetime_schema {
                groups
                    .entry(partial.parent_column_name.clone())
                    .or_default()
                    .insert(partial.part, schema.name.clone());
            }
        }
        if groups.is_empty() {
            return Ok(table);
        }

        for (parent, parts) in &groups {
            if !parts.contains_key(&DatetimePart::Year) {
                return Err(TablecastError::Validation(format!(
                    "missing required year part for '{}'",
                    parent
                )));
            }

            let series = [
                DatetimePart::Year,
                DatetimePart::Month,
                DatetimePart::Day,
                DatetimePart::Hour,
                DatetimePart::Minute,
                DatetimePart::Second,
            ]
            .map(|part| {
                part_series(
                    &table.data,
                    parts.get(&part).map(String::as_str),
                    part.default_value(),
                    parent,
                )
            });
            let mut resolved = Vec::with_capacity(series.len());
            for s in series {
                resolved.push(s?);
            }

            let height = table.data.height();
            let mut composite = Vec::with_capacity(height);
            for row in 0..height {
                let components: Vec<Option<i64>> =
                    resolved.iter().map(|s| s.value(row)).collect();
                composite.push(match components.iter().copied().collect::<Option<Vec<i64>>>() {
                    None => None,
                    Some(c) => Some(build_datetime(&c).ok_or_else(|| {
                        TablecastError::parse(
                            parent.as_str(),
                            format!("invalid datetime components {:?}", c),
                        )
                    })?),
                });
            }

            table.data.insert(parent.clone(), Column::DateTime(composite))?;
            for part_column in parts.values() {
                if part_column != parent {
                    table.data.drop_column(part_column);
                }
            }
        }

        Ok(table)
    }
}

/// Per-row source of one datetime component.
enum PartSeries {
    Const(Option<i64>),
    Values(Vec<Option<i64>>),
}

impl PartSeries {
    fn value(&self, row: usize) -> Option<i64> {
        match self {
            PartSeries::Const(default) => *default,
            PartSeries::Values(values) => values.get(row).copied().flatten(),
        }
    }
}

/// Resolve a part column to a component series. Absent columns fall back
/// to the part default; text values are parsed loosely, with unparsable
/// values also falling back to the default.
fn part_series(
    frame: &Frame,
    column: Option<&str>,
    default: Option<i64>,
    parent: &str,
) -> Result<PartSeries> {
    let Some(name) = column else {
        return Ok(PartSeries::Const(default));
    };
    let Some(source) = frame.column(name) else {
        return Ok(PartSeries::Const(default));
    };
    match source {
        Column::Integer(v) => Ok(PartSeries::Values(v.clone())),
        Column::Float(v) => Ok(PartSeries::Values(
            v.iter().map(|c| c.map(|f| f as i64)).collect(),
        )),
        Column::Text(v) | Column::Categorical(v) => Ok(PartSeries::Values(
            v.iter()
                .map(|c| {
                    c.as_ref()
                        .and_then(|s| s.trim().parse::<i64>().ok())
                        .or(default)
                })
                .collect(),
        )),
        other => Err(TablecastError::parse(
            name,
            format!(
                "cannot use {:?} column as a datetime part for '{}'",
                other.column_type(),
                parent
            ),
        )),
    }
}

/// Assemble [year, month, day, hour, minute, second] components into a
/// timestamp; out-of-range components yield `None`.
fn build_datetime(c: &[i64]) -> Option<NaiveDateTime> {
    let year = i32::try_from(c[0]).ok()?;
    let month = u32::try_from(c[1]).ok()?;
    let day = u32::try_from(c[2]).ok()?;
    let hour = u32::try_from(c[3]).ok()?;
    let minute = u32::try_from(c[4]).ok()?;
    let second = u32::try_from(c[5]).ok()?;
    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)
}

/// Demotes text columns with low value uniqueness to categorical.
pub struct StringToCategoricalTransform {
    uniqueness_threshold: f64,
    min_unique: usize,
    max_unique: usize,
}

impl StringToCategoricalTransform {
    pub fn new(uniqueness_threshold: f64, min_unique: usize, max_unique: usize) -> Self {
        Self {
            uniqueness_threshold,
            min_unique,
            max_unique,
        }
    }
}

impl Default for StringToCategoricalTransform {
    fn default() -> Self {
        Self::new(0.1, 1, 100)
    }
}

impl Transform for StringToCategoricalTransform {
    fn name(&self) -> &'static str {
        "StringToCategoricalTransform"
    }

    fn transform(&self, mut table: Table) -> Result<Table> {
        let mut demote = Vec::new();
        for (name, column) in table.data.iter() {
            let Column::Text(cells) = column else {
                continue;
            };
            let total = column.non_null_count();
            if total == 0 {
                continue;
            }
            let distinct: std::collections::HashSet<&str> = cells
                .iter()
                .filter_map(|c| c.as_deref())
                .collect();
            let unique = distinct.len();
            let ratio = unique as f64 / total as f64;
            if self.min_unique <= unique
                && unique <= self.max_unique
                && ratio <= self.uniqueness_threshold
            {
                demote.push((name.clone(), Column::Categorical(cells.clone())));
            }
        }
        for (name, column) in demote {
            table.data.insert(name, column)?;
        }
        Ok(table)
    }
}

/// Reorders columns into the canonical order: datetime, then
/// categorical/text, then numeric, each group alphabetical. Columns
/// outside every classification (booleans) trail the numerics so that
/// the reordering never discards data.
pub struct DefaultColumnSortingTransform;

impl Transform for DefaultColumnSortingTransform {
    fn name(&self) -> &'static str {
        "DefaultColumnSortingTransform"
    }

    fn transform(&self, mut table: Table) -> Result<Table> {
        let mut datetime = table.datetime_columns();
        let mut categorical = table.categorical_columns();
        let mut numeric = table.numeric_columns();
        datetime.sort();
        categorical.sort();
        numeric.sort();

        let mut order = Vec::with_capacity(table.data.width());
        order.extend(datetime);
        order.extend(categorical);
        order.extend(numeric);
        let mut rest: Vec<String> = table
            .data
            .column_names()
            .into_iter()
            .filter(|name| !order.contains(name))
            .collect();
        rest.sort();
        order.extend(rest);

        table.data = table.data.select(&order)?;
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{ColumnType, TableSource, Value};

    fn text_column(values: &[&str]) -> Column {
        Column::Text(values.iter().map(|v| Some(v.to_string())).collect())
    }

    fn table_from(columns: Vec<(&str, Column)>) -> Table {
        let frame = Frame::with_columns(
            columns
                .into_iter()
                .map(|(n, c)| (n.to_string(), c))
                .collect(),
        )
        .unwrap();
        Table::new("test_table", TableSource::Other, frame)
    }

    #[test]
    fn test_schema_transform_missing_column() {
        let table = table_from(vec![("a", text_column(&["1"]))]);
        let transform = ColumnSchemaTransform::new(vec![ColumnSchema::new(
            "missing",
            DataType::Integer,
        )])
        .unwrap();
        let err = transform.apply(&table).unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_schema_transform_drops_unlisted_columns() {
        let table = table_from(vec![
            ("keep", text_column(&["1", "2"])),
            ("drop", text_column(&["x", "y"])),
        ]);
        let transform = ColumnSchemaTransform::new(vec![
            ColumnSchema::new("keep", DataType::Integer)
        ])
        .unwrap();
        let result = transform.apply(&table).unwrap();
        assert_eq!(result.data.column_names(), vec!["keep"]);
    }

    #[test]
    fn test_schema_transform_null_tokens() {
        let table = table_from(vec![("n", text_column(&["1", "", "-", "3"]))]);
        let transform =
            ColumnSchemaTransform::new(vec![ColumnSchema::new("n", DataType::Integer)]).unwrap();
        let result = transform.apply(&table).unwrap();
        let column = result.data.column("n").unwrap();
        assert_eq!(column.get(0), Value::Int(1));
        assert_eq!(column.get(1), Value::Null);
        assert_eq!(column.get(2), Value::Null);
        assert_eq!(column.get(3), Value::Int(3));
    }

    #[test]
    fn test_schema_transform_boolean_tokens() {
        let table = table_from(vec![("b", text_column(&["YES", "no", "True", "0", "1"]))]);
        let transform =
            ColumnSchemaTransform::new(vec![ColumnSchema::new("b", DataType::Boolean)]).unwrap();
        let result = transform.apply(&table).unwrap();
        let column = result.data.column("b").unwrap();
        assert_eq!(column.get(0), Value::Bool(true));
        assert_eq!(column.get(1), Value::Bool(false));
        assert_eq!(column.get(2), Value::Bool(true));
        assert_eq!(column.get(3), Value::Bool(false));
        assert_eq!(column.get(4), Value::Bool(true));
    }

    #[test]
    fn test_schema_transform_cast_failure_names_column() {
        let table = table_from(vec![("age", text_column(&["25", "unknown"]))]);
        let transform =
            ColumnSchemaTransform::new(vec![ColumnSchema::new("age", DataType::Integer)]).unwrap();
        let err = transform.apply(&table).unwrap_err();
        assert!(matches!(err, TablecastError::Parse { ref column, .. } if column == "age"));
    }

    #[test]
    fn test_schema_transform_identity_on_canonical_text() {
        // Cleaning and casting a column already in canonical form is an
        // identity.
        let table = table_from(vec![("name", text_column(&["Alice", "Bob"]))]);
        let transform = ColumnSchemaTransform::new(vec![
            ColumnSchema::new("name", DataType::Text).with_cleaning_pattern("[^a-zA-Z0-9]"),
        ])
        .unwrap();
        let result = transform.apply(&table).unwrap();
        assert_eq!(result.data.column("name").unwrap(), table.data.column("name").unwrap());
    }

    #[test]
    fn test_datetime_format_fallbacks() {
        assert!(parse_datetime("2023-01-01T10:30:00", None).is_some());
        assert!(parse_datetime("2023-01-01 10:30:00", None).is_some());
        assert!(parse_datetime("2023-01-01", None).is_some());
        assert!(parse_datetime("not a date", None).is_none());
        let midnight = parse_datetime("2023-05-04", Some("%Y-%m-%d")).unwrap();
        assert_eq!(midnight.time(), NaiveTime::MIN);
    }

    #[test]
    fn test_fuse_requires_year() {
        let table = table_from(vec![("month", Column::Integer(vec![Some(1)]))]);
        let schemas = vec![
            ColumnSchema::new("month", DataType::Integer)
                .with_datetime_part(DatetimePart::Month, "when"),
        ];
        let err = FusePartialDatetimeColumnsTransform::new(schemas)
            .apply(&table)
            .unwrap_err();
        assert!(err.to_string().contains("year"));
    }

    #[test]
    fn test_fuse_defaults_for_missing_parts() {
        let table = table_from(vec![
            ("year", Column::Integer(vec![Some(2023), Some(2024)])),
            ("value", Column::Integer(vec![Some(1), Some(2)])),
        ]);
        let schemas = vec![
            ColumnSchema::new("year", DataType::Integer)
                .with_datetime_part(DatetimePart::Year, "when"),
        ];
        let result = FusePartialDatetimeColumnsTransform::new(schemas)
            .apply(&table)
            .unwrap();
        let column = result.data.column("when").unwrap();
        assert_eq!(
            column.get(0),
            Value::DateTime(
                NaiveDate::from_ymd_opt(2023, 1, 1)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap()
            )
        );
        assert!(!result.data.contains("year"));
        assert!(result.data.contains("value"));
    }

    #[test]
    fn test_fuse_absent_part_column_uses_default() {
        // The schema names a day column the table does not have; the
        // default applies instead of failing.
        let table = table_from(vec![("year", Column::Integer(vec![Some(2023)]))]);
        let schemas = vec![
            ColumnSchema::new("year", DataType::Integer)
                .with_datetime_part(DatetimePart::Year, "when"),
            ColumnSchema::new("day", DataType::Integer)
                .with_datetime_part(DatetimePart::Day, "when"),
        ];
        let result = FusePartialDatetimeColumnsTransform::new(schemas)
            .apply(&table)
            .unwrap();
        assert!(result.data.contains("when"));
    }

    #[test]
    fn test_fuse_loose_text_parts() {
        let table = table_from(vec![
            ("year", text_column(&["2023", "bad"])),
            ("month", text_column(&["6", "7"])),
        ]);
        let schemas = vec![
            ColumnSchema::new("year", DataType::Integer)
                .with_datetime_part(DatetimePart::Year, "when"),
            ColumnSchema::new("month", DataType::Integer)
                .with_datetime_part(DatetimePart::Month, "when"),
        ];
        let result = FusePartialDatetimeColumnsTransform::new(schemas)
            .apply(&table)
            .unwrap();
        let column = result.data.column("when").unwrap();
        assert_eq!(
            column.get(0),
            Value::DateTime(
                NaiveDate::from_ymd_opt(2023, 6, 1)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap()
            )
        );
        // The year has no default, so an unparsable year yields a null
        // timestamp.
        assert_eq!(column.get(1), Value::Null);
    }

    #[test]
    fn test_fuse_without_partial_schemas_is_noop() {
        let table = table_from(vec![("value", Column::Integer(vec![Some(1)]))]);
        let schemas = vec![ColumnSchema::new("value", DataType::Integer)];
        let result = FusePartialDatetimeColumnsTransform::new(schemas)
            .apply(&table)
            .unwrap();
        assert_eq!(result.data, table.data);
    }

    #[test]
    fn test_categorical_threshold_boundary() {
        // 3 distinct over 5 rows = 60% uniqueness.
        let column = text_column(&["a", "a", "b", "b", "c"]);
        let table = table_from(vec![("status", column)]);

        let strict = StringToCategoricalTransform::new(0.5, 1, 10);
        let result = strict.apply(&table).unwrap();
        assert_eq!(
            result.data.column("status").unwrap().column_type(),
            ColumnType::Text
        );

        let lenient = StringToCategoricalTransform::new(0.6, 1, 10);
        let result = lenient.apply(&table).unwrap();
        assert_eq!(
            result.data.column("status").unwrap().column_type(),
            ColumnType::Categorical
        );

        // Outside the unique-count window the demotion is skipped even
        // when the ratio passes.
        let windowed = StringToCategoricalTransform::new(0.6, 4, 10);
        let result = windowed.apply(&table).unwrap();
        assert_eq!(
            result.data.column("status").unwrap().column_type(),
            ColumnType::Text
        );
    }

    #[test]
    fn test_categorical_ignores_non_text() {
        let table = table_from(vec![("n", Column::Integer(vec![Some(1), Some(1)]))]);
        let result = StringToCategoricalTransform::default().apply(&table).unwrap();
        assert_eq!(result.data, table.data);
    }

    #[test]
    fn test_sorting_idempotent() {
        let table = table_from(vec![
            ("num_b", Column::Integer(vec![Some(1)])),
            ("cat_a", Column::Categorical(vec![Some("x".into())])),
            ("when", Column::DateTime(vec![None])),
            ("num_a", Column::Float(vec![Some(1.0)])),
            ("flag", Column::Boolean(vec![Some(true)])),
        ]);
        let once = DefaultColumnSortingTransform.apply(&table).unwrap();
        assert_eq!(
            once.data.column_names(),
            vec!["when", "cat_a", "num_a", "num_b", "flag"]
        );
        let twice = DefaultColumnSortingTransform.apply(&once).unwrap();
        assert_eq!(once.data.column_names(), twice.data.column_names());
    }
}
