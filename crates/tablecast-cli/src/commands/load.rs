//! Load command: normalize a CSV and print a summary.

use std::error::Error;
use std::path::PathBuf;

use colored::Colorize;

use crate::cli::OracleChoice;

use super::{format_table, load_table};

pub fn run(
    file: PathBuf,
    schema: Option<PathBuf>,
    oracle: OracleChoice,
    rows: usize,
    verbose: bool,
) -> Result<(), Box<dyn Error>> {
    let table = load_table(&file, &schema, &oracle)?;
    let (height, width) = table.data.shape();

    println!("{} {}", "Table:".bold(), table.name);
    println!("{} {} rows x {} columns", "Shape:".bold(), height, width);
    println!(
        "{} {}",
        "Dimensions:".bold(),
        table.dimension_columns().join(", ")
    );
    println!(
        "{} {}",
        "Measures:".bold(),
        table.numeric_columns().join(", ")
    );
    if verbose {
        println!(
            "{} {}",
            "Datetime:".bold(),
            table.datetime_columns().join(", ")
        );
        println!(
            "{} {}",
            "Categorical:".bold(),
            table.categorical_columns().join(", ")
        );
    }

    println!();
    println!("{}", format_table(&table, rows));
    if height > rows {
        println!("{}", format!("... {} more rows", height - rows).dimmed());
    }

    Ok(())
}
