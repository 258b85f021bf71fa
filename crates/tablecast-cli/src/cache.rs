//! In-memory cache for processed tables.

use std::collections::HashMap;

use tablecast::Table;
use tracing::debug;

/// Capacity-bounded table cache. When full, the single oldest-inserted
/// entry is evicted before a new one goes in.
pub struct TableCache {
    entries: HashMap<String, CacheEntry>,
    max_size: usize,
    clock: u64,
}

struct CacheEntry {
    table: Table,
    inserted_at: u64,
}

impl TableCache {
    /// Default maximum number of cached tables.
    pub const DEFAULT_CAPACITY: usize = 100;

    /// Create a cache holding at most `max_size` tables.
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: HashMap::new(),
            max_size,
            clock: 0,
        }
    }

    /// Generate a cache key for a table: the table name plus a random
    /// 12-character hex suffix.
    pub fn generate_key(table: &Table) -> String {
        format!(
            "{}:{:012x}",
            table.name,
            fastrand::u64(..) & 0xffff_ffff_ffff
        )
    }

    /// Store a table, generating a key when none is supplied. Returns
    /// the key used.
    pub fn put(&mut self, table: Table, key: Option<String>) -> String {
        let key = key.unwrap_or_else(|| Self::generate_key(&table));

        if self.entries.len() >= self.max_size {
            self.evict_oldest();
        }

        self.clock += 1;
        self.entries.insert(
            key.clone(),
            CacheEntry {
                table,
                inserted_at: self.clock,
            },
        );
        debug!(%key, "cached table");
        key
    }

    /// Retrieve a table by key.
    pub fn get(&self, key: &str) -> Option<Table> {
        let hit = self.entries.get(key).map(|e| e.table.clone());
        debug!(%key, hit = hit.is_some(), "cache lookup");
        hit
    }

    /// Number of cached tables.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when the cache is empty.
    #[allow(dead_code)] // Kept for API completeness
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of cached tables.
    pub fn capacity(&self) -> usize {
        self.max_size
    }

    /// All cache keys.
    #[allow(dead_code)] // Kept for API completeness
    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Remove all entries.
    #[allow(dead_code)] // Kept for API completeness
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, e)| e.inserted_at)
            .map(|(k, _)| k.clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
            debug!(%key, "evicted oldest cache entry");
        }
    }
}

impl Default for TableCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
