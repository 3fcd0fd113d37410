//! Read-through cache of raw source tables.
//!
//! Keys are source locators qualified by sheet/skip settings. Entries live as long as the
//! owning context; there is no eviction and no invalidation when a file changes on disk.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use polars::prelude::DataFrame;
use tracing::debug;

use crate::error::DashResult;

#[derive(Clone, Default)]
pub struct TableCache {
    map: Arc<RwLock<HashMap<String, Arc<DataFrame>>>>,
}

impl TableCache {
    pub fn new() -> Self { Self::default() }

    /// Return the cached table for `key`, or run `load` and remember its result.
    /// Failed loads are not cached.
    pub fn get_or_load<F>(&self, key: &str, load: F) -> DashResult<Arc<DataFrame>>
    where
        F: FnOnce() -> DashResult<DataFrame>,
    {
        if let Some(df) = self.map.read().get(key) {
            debug!(target: "healthdash::storage", "cache hit: key='{}'", key);
            return Ok(df.clone());
        }
        debug!(target: "healthdash::storage", "cache miss: key='{}'", key);
        let loaded = Arc::new(load()?);
        let mut guard = self.map.write();
        // Two readers may have raced on the same key; the first insert wins.
        let entry = guard.entry(key.to_string()).or_insert(loaded);
        Ok(entry.clone())
    }

    pub fn contains(&self, key: &str) -> bool { self.map.read().contains_key(key) }

    pub fn len(&self) -> usize { self.map.read().len() }

    pub fn is_empty(&self) -> bool { self.map.read().is_empty() }

    /// Cached keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.map.read().keys().cloned().collect();
        keys.sort();
        keys
    }
}
