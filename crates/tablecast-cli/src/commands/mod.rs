//! CLI command implementations.

pub mod analyze;
pub mod load;
pub mod serve;

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tablecast::{AnthropicOracle, ColumnSchema, Loader, MockOracle, SchemaOracle, Table};

use crate::cli::OracleChoice;

/// Build the configured oracle.
pub fn build_oracle(choice: &OracleChoice) -> Result<Arc<dyn SchemaOracle>, Box<dyn Error>> {
    match choice {
        OracleChoice::Mock => Ok(Arc::new(MockOracle::new())),
        OracleChoice::Anthropic => Ok(Arc::new(AnthropicOracle::from_env()?)),
    }
}

/// Read an explicit column schema from a JSON file.
pub fn read_schema_file(path: &Path) -> Result<Vec<ColumnSchema>, Box<dyn Error>> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Load a table with either an explicit schema or the chosen oracle.
pub fn load_table(
    file: &PathBuf,
    schema: &Option<PathBuf>,
    oracle: &OracleChoice,
) -> Result<Table, Box<dyn Error>> {
    let schemas = match schema {
        Some(path) => Some(read_schema_file(path)?),
        None => None,
    };
    let loader = if schemas.is_some() {
        Loader::new()
    } else {
        Loader::new().with_oracle(build_oracle(oracle)?)
    };
    Ok(loader.load_path(file, schemas)?)
}

/// Render a row window of a table as aligned text.
pub fn format_table(table: &Table, rows: usize) -> String {
    let names = table.data.column_names();
    let height = table.data.height().min(rows);

    let mut cells: Vec<Vec<String>> = vec![names.clone()];
    for row in 0..height {
        cells.push(
            names
                .iter()
                .map(|name| {
                    let value = table.data.column(name).map(|c| c.get(row));
                    match value {
                        Some(tablecast::Value::Null) | None => String::new(),
                        Some(v) => v.render(),
                    }
                })
                .collect(),
        );
    }

    let widths: Vec<usize> = (0..names.len())
        .map(|col| cells.iter().map(|row| row[col].len()).max().unwrap_or(0))
        .collect();

    cells
        .iter()
        .map(|row| {
            row.iter()
                .zip(&widths)
                .map(|(cell, &width)| format!("{:<width$}", cell))
                .collect::<Vec<_>>()
                .join("  ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}
