//! Tenant-aware store: tenant → key → value.
//!
//! Each tenant gets its own [`MemoryStore`], created on first insert and
//! dropped as soon as its last key is removed, so an unknown tenant and an
//! empty tenant look the same from outside.
//!
//! ```text
//!   tenants: MemoryStore<T, MemoryStore<K, V>>
//!
//!   "acme"   ──► { "user:1" → v1, "user:2" → v2 }
//!   "globex" ──► { "user:1" → v3 }
//! ```

use std::fmt;
use std::hash::Hash;

use crate::store::memory::MemoryStore;
use crate::store::metrics::StoreMetrics;

/// Single-threaded two-level store keyed by `(tenant, key)`.
pub struct ShardedStore<T, K, V> {
    tenants: MemoryStore<T, MemoryStore<K, V>>,
}

impl<T, K, V> ShardedStore<T, K, V>
where
    T: Eq + Hash,
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            tenants: MemoryStore::new(),
        }
    }

    /// Fetches a value, counting a hit or miss on the tenant's store.
    pub fn lookup(&self, tenant: &T, key: &K) -> Option<&V> {
        self.tenants.peek(tenant)?.lookup(key)
    }

    pub fn peek(&self, tenant: &T, key: &K) -> Option<&V> {
        self.tenants.peek(tenant)?.peek(key)
    }

    /// Inserts or overwrites, creating the tenant if needed.
    pub fn insert(&mut self, tenant: T, key: K, value: V) -> Option<V> {
        if let Some(store) = self.tenants.peek_mut(&tenant) {
            return store.insert(key, value);
        }
        let mut store = MemoryStore::new();
        store.insert(key, value);
        self.tenants.insert(tenant, store);
        None
    }

    /// Removes one key; prunes the tenant if that was its last key.
    pub fn remove(&mut self, tenant: &T, key: &K) -> Option<V> {
        let store = self.tenants.peek_mut(tenant)?;
        let removed = store.remove(key);
        if store.is_empty() {
            self.tenants.remove(tenant);
        }
        removed
    }

    /// Drops a whole tenant and returns how many keys it held.
    pub fn remove_tenant(&mut self, tenant: &T) -> usize {
        self.tenants
            .remove(tenant)
            .map(|store| store.len())
            .unwrap_or(0)
    }

    pub fn contains(&self, tenant: &T, key: &K) -> bool {
        self.tenants
            .peek(tenant)
            .is_some_and(|store| store.contains(key))
    }

    pub fn contains_tenant(&self, tenant: &T) -> bool {
        self.tenants.contains(tenant)
    }

    /// Number of tenants holding at least one key.
    pub fn tenant_count(&self) -> usize {
        self.tenants.len()
    }

    pub fn tenant_len(&self, tenant: &T) -> usize {
        self.tenants.peek(tenant).map_or(0, MemoryStore::len)
    }

    /// Total keys across all tenants.
    pub fn len(&self) -> usize {
        self.tenants.iter().map(|(_, store)| store.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tenants.is_empty()
    }

    pub fn clear(&mut self) {
        self.tenants.clear();
    }

    pub fn tenants(&self) -> impl Iterator<Item = &T> {
        self.tenants.keys()
    }

    /// Keys of one tenant, in no particular order.
    pub fn keys(&self, tenant: &T) -> impl Iterator<Item = &K> {
        self.tenants
            .peek(tenant)
            .into_iter()
            .flat_map(|store| store.keys())
    }

    /// Counters summed over all live tenants.
    pub fn metrics(&self) -> StoreMetrics {
        self.tenants
            .iter()
            .map(|(_, store)| store.metrics())
            .fold(StoreMetrics::default(), |acc, m| StoreMetrics {
                hits: acc.hits + m.hits,
                misses: acc.misses + m.misses,
                inserts: acc.inserts + m.inserts,
                updates: acc.updates + m.updates,
                removes: acc.removes + m.removes,
                evictions: acc.evictions + m.evictions,
            })
    }
}

impl<T, K, V> Default for ShardedStore<T, K, V>
where
    T: Eq + Hash,
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, K, V> fmt::Debug for ShardedStore<T, K, V>
where
    T: Eq + Hash,
    K: Eq + Hash,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShardedStore")
            .field("tenants", &self.tenant_count())
            .field("len", &self.len())
            .finish()
    }
}
