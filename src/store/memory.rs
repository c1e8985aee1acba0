//! Unsynchronized in-memory store.
//!
//! ## Architecture
//! - Keys map to values in an `FxHashMap<K, V>` for O(1) lookup.
//! - No capacity and no eviction order: policies own those decisions and
//!   report evictions back via [`MemoryStore::record_eviction`].
//! - Hit/miss/insert/update/remove counters use atomics so `&self` lookups
//!   are still counted.
//!
//! ## Example Usage
//! ```rust
//! use std::sync::Arc;
//!
//! use evictkit::store::MemoryStore;
//! use evictkit::traits::Cache;
//!
//! let mut store: MemoryStore<&str, Arc<String>> = MemoryStore::new();
//! store.set("greeting", "hello".to_string()).unwrap();
//! assert_eq!(store.get(&"greeting").unwrap().as_str(), "hello");
//!
//! store.delete(&"greeting").unwrap();
//! assert!(store.get(&"greeting").unwrap_err().is_not_found());
//! assert_eq!(store.metrics().misses, 1);
//! ```
//!
//! ## Thread Safety
//! - Single-threaded. Wrap in
//!   [`Synchronized`](crate::policy::synchronized::Synchronized) to share.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::CacheError;
use crate::store::metrics::{StoreCounters, StoreMetrics};
use crate::traits::Cache;

/// Single-threaded key/value map with store-level counters.
pub struct MemoryStore<K, V> {
    map: FxHashMap<K, V>,
    metrics: StoreCounters,
}

impl<K, V> MemoryStore<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a store with room for `capacity` entries before reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            map: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            metrics: StoreCounters::default(),
        }
    }

    /// Fetches a value, counting a hit or a miss.
    pub fn lookup(&self, key: &K) -> Option<&V> {
        match self.map.get(key) {
            Some(value) => {
                self.metrics.inc_hit();
                Some(value)
            },
            None => {
                self.metrics.inc_miss();
                None
            },
        }
    }

    /// Fetches a value without touching the counters.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.map.get(key)
    }

    pub fn peek_mut(&mut self, key: &K) -> Option<&mut V> {
        self.map.get_mut(key)
    }

    /// Inserts or overwrites. Returns the previous value if there was one.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let previous = self.map.insert(key, value);
        if previous.is_some() {
            self.metrics.inc_update();
        } else {
            self.metrics.inc_insert();
        }
        previous
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let removed = self.map.remove(key);
        if removed.is_some() {
            self.metrics.inc_remove();
        }
        removed
    }

    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Drops every entry. Counters are kept.
    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Keeps only the entries for which `keep` returns `true`.
    ///
    /// Returns how many entries were dropped; each counts as a remove.
    pub fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        let before = self.map.len();
        self.map.retain(|key, value| keep(key, value));
        let dropped = before - self.map.len();
        for _ in 0..dropped {
            self.metrics.inc_remove();
        }
        dropped
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.map.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&K, &mut V)> {
        self.map.iter_mut()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.map.keys()
    }

    /// Counts an eviction decided by the owning policy.
    pub fn record_eviction(&self) {
        self.metrics.inc_eviction();
    }

    /// Snapshot of the store counters.
    pub fn metrics(&self) -> StoreMetrics {
        self.metrics.snapshot()
    }

    pub fn reset_metrics(&self) {
        self.metrics.reset();
    }
}

impl<K, V> Default for MemoryStore<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for MemoryStore<K, V>
where
    K: Eq + Hash,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("len", &self.len())
            .field("metrics", &self.metrics())
            .finish_non_exhaustive()
    }
}

impl<K, V> Cache<K, V> for MemoryStore<K, Arc<V>>
where
    K: Eq + Hash,
{
    fn get(&mut self, key: &K) -> Result<Arc<V>, CacheError> {
        self.lookup(key).cloned().ok_or(CacheError::NotFound)
    }

    fn set(&mut self, key: K, value: V) -> Result<(), CacheError> {
        self.insert(key, Arc::new(value));
        Ok(())
    }

    fn delete(&mut self, key: &K) -> Result<(), CacheError> {
        self.remove(key);
        Ok(())
    }

    fn contains(&self, key: &K) -> bool {
        MemoryStore::contains(self, key)
    }

    fn len(&self) -> usize {
        MemoryStore::len(self)
    }
}
