//! Analyze command: run a concentration analysis end-to-end.

use std::error::Error;
use std::path::PathBuf;

use colored::Colorize;
use tablecast::{ConcentrationAnalysisTransform, Transform};

use crate::cli::OracleChoice;

use super::{format_table, load_table};

pub fn run(
    file: PathBuf,
    on: String,
    by: Vec<String>,
    schema: Option<PathBuf>,
    oracle: OracleChoice,
    json: bool,
    verbose: bool,
) -> Result<(), Box<dyn Error>> {
    let table = load_table(&file, &schema, &oracle)?;
    if verbose {
        eprintln!(
            "loaded '{}' ({} rows), measures: {}",
            table.name,
            table.data.height(),
            table.numeric_columns().join(", ")
        );
    }

    let transform = ConcentrationAnalysisTransform::new(on.clone(), by.clone());
    let report = transform.apply(&table)?;

    if json {
        let records = report.data.to_records(0, report.data.height());
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        println!(
            "{} {} by [{}]",
            "Concentration of".bold(),
            on.bold(),
            by.join(", ")
        );
        println!();
        println!("{}", format_table(&report, report.data.height()));
    }

    Ok(())
}
