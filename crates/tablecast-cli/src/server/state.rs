//! Application state for the web server.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use tablecast::{Loader, SchemaOracle};

use crate::cache::TableCache;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Cache of processed tables.
    pub cache: Arc<RwLock<TableCache>>,
    /// Uploaded CSV blobs keyed by file key.
    pub files: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    /// Oracle used when a load has no explicit schema.
    pub oracle: Arc<dyn SchemaOracle>,
}

impl AppState {
    /// Create new application state.
    pub fn new(oracle: Arc<dyn SchemaOracle>, cache_capacity: usize) -> Self {
        Self {
            cache: Arc::new(RwLock::new(TableCache::new(cache_capacity))),
            files: Arc::new(RwLock::new(HashMap::new())),
            oracle,
        }
    }

    /// Build a loader wired to this state's oracle.
    pub fn loader(&self) -> Loader {
        Loader::new().with_oracle(self.oracle.clone())
    }
}
