//! Web service exposing the loader, cache and concentration analysis
//! over JSON.

mod app;
mod error;
mod handlers;
mod state;

pub use app::{create_router, run_server};
pub use state::AppState;
