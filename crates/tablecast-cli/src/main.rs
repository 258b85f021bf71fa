//! Tablecast CLI - schema-normalizing table engine.

mod cache;
mod cli;
mod commands;
mod server;
mod wire;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Load {
            file,
            schema,
            oracle,
            rows,
        } => commands::load::run(file, schema, oracle, rows, cli.verbose),

        Commands::Analyze {
            file,
            on,
            by,
            schema,
            oracle,
            json,
        } => commands::analyze::run(file, on, by, schema, oracle, json, cli.verbose),

        Commands::Serve {
            port,
            oracle,
            capacity,
        } => commands::serve::run(port, oracle, capacity),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
