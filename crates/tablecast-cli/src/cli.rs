//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tablecast: schema-normalizing table engine
#[derive(Parser)]
#[command(name = "tablecast")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load a CSV file and print the normalized table
    Load {
        /// Path to the CSV file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Explicit column schema JSON (skips inference)
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Schema inference oracle to use
        #[arg(long, default_value = "mock")]
        oracle: OracleChoice,

        /// Number of preview rows to print
        #[arg(short, long, default_value = "10")]
        rows: usize,
    },

    /// Run a concentration analysis on a CSV file
    Analyze {
        /// Path to the CSV file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Measure column to analyze
        #[arg(long)]
        on: String,

        /// Dimension columns to partition by (comma-separated)
        #[arg(long, value_delimiter = ',')]
        by: Vec<String>,

        /// Explicit column schema JSON (skips inference)
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Schema inference oracle to use
        #[arg(long, default_value = "mock")]
        oracle: OracleChoice,

        /// Output the result as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Run the web service
    Serve {
        /// Port for the web server
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Schema inference oracle to use
        #[arg(long, default_value = "mock")]
        oracle: OracleChoice,

        /// Maximum number of cached tables
        #[arg(long, default_value = "100")]
        capacity: usize,
    },
}

/// Schema inference oracle choice
#[derive(Clone, Debug, Default)]
pub enum OracleChoice {
    /// Rule-based mock oracle (offline, deterministic)
    #[default]
    Mock,
    /// Anthropic Claude API (requires ANTHROPIC_API_KEY)
    Anthropic,
}

impl std::str::FromStr for OracleChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mock" | "test" => Ok(OracleChoice::Mock),
            "anthropic" | "claude" => Ok(OracleChoice::Anthropic),
            _ => Err(format!("Unknown oracle: {}. Use: mock or anthropic.", s)),
        }
    }
}

impl std::fmt::Display for OracleChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OracleChoice::Mock => write!(f, "mock"),
            OracleChoice::Anthropic => write!(f, "anthropic"),
        }
    }
}
