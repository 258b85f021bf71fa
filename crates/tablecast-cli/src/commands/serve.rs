//! Serve command: run the web service.

use std::error::Error;

use crate::cli::OracleChoice;
use crate::server::{run_server, AppState};

use super::build_oracle;

pub fn run(port: u16, oracle: OracleChoice, capacity: usize) -> Result<(), Box<dyn Error>> {
    let oracle = build_oracle(&oracle)?;
    let state = AppState::new(oracle, capacity);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run_server(state, port))
}
