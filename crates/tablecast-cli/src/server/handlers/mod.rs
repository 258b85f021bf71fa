//! HTTP request handlers.

mod analyses;
mod files;
mod health;

pub use analyses::run_concentration;
pub use files::{load_file, upload_file};
pub use health::{health_check, root};
