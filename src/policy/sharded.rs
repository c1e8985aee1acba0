//! # Multi-tenant TTL Cache
//!
//! One cache, many isolated key spaces. Every call names a tenant and a key;
//! tenants never see each other's entries, and a whole tenant can be dropped
//! in one call with [`ShardedTtlCache::delete_shard`].
//!
//! ## Architecture
//!
//! ```text
//!   ┌───────────────────────────────────────────────────────────────────────┐
//!   │                    ShardedTtlCache<T, K, V>                           │
//!   │                                                                       │
//!   │   Arc<Mutex<ShardedState>>                                            │
//!   │                                                                       │
//!   │   set_at: FxHashMap<T, FxHashMap<K, Instant>>                         │
//!   │     "acme"   ──► { "user:1" → t0, "user:2" → t3 }                     │
//!   │     "globex" ──► { "user:1" → t1 }                                    │
//!   │                                                                       │
//!   │   data: ShardedStore<T, K, Arc<V>>                                    │
//!   │     "acme"   ──► { "user:1" → v0, "user:2" → v3 }                     │
//!   │     "globex" ──► { "user:1" → v1 }                                    │
//!   └───────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Timing and data maps change together: a tenant exists in both or in
//! neither, and it disappears from both when its last key goes.
//!
//! ## Validity
//!
//! An entry is valid when its tenant is known, its key is known, and either
//! `ttl` is zero or `now - set_at < ttl`. Reads check validity first and
//! delete what fails it.
//!
//! ## Example Usage
//!
//! ```
//! use std::time::Duration;
//!
//! use evictkit::policy::sharded::ShardedTtlCache;
//!
//! let cache = ShardedTtlCache::new(Duration::from_secs(60));
//! cache.set("acme", "user:1", "alice").unwrap();
//! cache.set("globex", "user:1", "bob").unwrap();
//!
//! assert_eq!(*cache.get(&"acme", &"user:1").unwrap(), "alice");
//!
//! cache.delete_shard(&"acme").unwrap();
//! assert!(cache.get(&"acme", &"user:1").unwrap_err().is_not_found());
//! assert_eq!(*cache.get(&"globex", &"user:1").unwrap(), "bob");
//! ```
//!
//! ## Background Sweep
//!
//! [`start_sweep`](ShardedTtlCache::start_sweep) walks every tenant and
//! every key on each tick, so a tick costs O(total keys) while holding the
//! lock.

use std::fmt;
use std::hash::Hash;
use std::ops::ControlFlow;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::error::CacheError;
use crate::store::sharded::ShardedStore;
use crate::sweep::Sweeper;
use crate::traits::{Cache, ConcurrentCache};

struct ShardedState<T, K, V> {
    set_at: FxHashMap<T, FxHashMap<K, Instant>>,
    data: ShardedStore<T, K, Arc<V>>,
}

impl<T, K, V> ShardedState<T, K, V>
where
    T: Eq + Hash + Clone,
    K: Eq + Hash + Clone,
{
    fn new() -> Self {
        Self {
            set_at: FxHashMap::default(),
            data: ShardedStore::new(),
        }
    }

    fn is_valid(&self, tenant: &T, key: &K, now: Instant, ttl: Duration) -> bool {
        let Some(&set_at) = self.set_at.get(tenant).and_then(|keys| keys.get(key)) else {
            return false;
        };
        ttl.is_zero() || now.saturating_duration_since(set_at) < ttl
    }

    fn get(&mut self, tenant: &T, key: &K, ttl: Duration) -> Result<Arc<V>, CacheError> {
        if !self.is_valid(tenant, key, Instant::now(), ttl) {
            self.delete(tenant, key);
            return Err(CacheError::NotFound);
        }
        self.data
            .lookup(tenant, key)
            .cloned()
            .ok_or(CacheError::NotFound)
    }

    fn set(&mut self, tenant: T, key: K, value: V) {
        self.set_at
            .entry(tenant.clone())
            .or_default()
            .insert(key.clone(), Instant::now());
        self.data.insert(tenant, key, Arc::new(value));
    }

    fn delete(&mut self, tenant: &T, key: &K) -> bool {
        let Some(keys) = self.set_at.get_mut(tenant) else {
            return false;
        };
        let removed = keys.remove(key).is_some();
        if keys.is_empty() {
            self.set_at.remove(tenant);
        }
        self.data.remove(tenant, key);
        removed
    }

    fn delete_shard(&mut self, tenant: &T) -> usize {
        let removed = self.set_at.remove(tenant).map_or(0, |keys| keys.len());
        self.data.remove_tenant(tenant);
        removed
    }

    fn sweep(&mut self, ttl: Duration) -> usize {
        if ttl.is_zero() {
            return 0;
        }
        let now = Instant::now();
        let expired: Vec<(T, K)> = self
            .set_at
            .iter()
            .flat_map(|(tenant, keys)| {
                keys.iter()
                    .filter(move |&(_, &at)| now.saturating_duration_since(at) >= ttl)
                    .map(move |(key, _)| (tenant.clone(), key.clone()))
            })
            .collect();
        for (tenant, key) in &expired {
            self.delete(tenant, key);
        }
        expired.len()
    }

    fn len(&self) -> usize {
        self.set_at.values().map(|keys| keys.len()).sum()
    }
}

/// Tenant-isolated cache with one engine-wide TTL.
pub struct ShardedTtlCache<T, K, V> {
    state: Arc<Mutex<ShardedState<T, K, V>>>,
    ttl: Duration,
}

impl<T, K, V> ShardedTtlCache<T, K, V>
where
    T: Eq + Hash + Clone,
    K: Eq + Hash + Clone,
{
    /// Creates an empty cache; a zero `ttl` means entries never expire.
    pub fn new(ttl: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(ShardedState::new())),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Value of `key` in `tenant`, or [`CacheError::NotFound`] if absent or
    /// expired. An expired entry is deleted on the way out.
    pub fn get(&self, tenant: &T, key: &K) -> Result<Arc<V>, CacheError> {
        self.state.lock().get(tenant, key, self.ttl)
    }

    /// Stores `value` and restarts the key's TTL.
    pub fn set(&self, tenant: T, key: K, value: V) -> Result<(), CacheError> {
        self.state.lock().set(tenant, key, value);
        Ok(())
    }

    /// Removes one key. Unknown tenants and keys are ignored.
    pub fn delete(&self, tenant: &T, key: &K) -> Result<(), CacheError> {
        self.state.lock().delete(tenant, key);
        Ok(())
    }

    /// Stores `value` only if the key is absent or expired.
    pub fn set_nx(&self, tenant: T, key: K, value: V) -> Result<bool, CacheError> {
        let mut state = self.state.lock();
        if state.is_valid(&tenant, &key, Instant::now(), self.ttl) {
            return Ok(false);
        }
        state.set(tenant, key, value);
        Ok(true)
    }

    /// Removes every key of `tenant` under a single lock acquisition.
    pub fn delete_shard(&self, tenant: &T) -> Result<(), CacheError> {
        let removed = self.state.lock().delete_shard(tenant);
        if removed > 0 {
            debug!(removed, "dropped tenant shard");
        }
        Ok(())
    }

    /// `true` if the entry exists and has not expired.
    pub fn contains(&self, tenant: &T, key: &K) -> bool {
        self.state
            .lock()
            .is_valid(tenant, key, Instant::now(), self.ttl)
    }

    /// Tenants holding at least one key.
    pub fn tenant_count(&self) -> usize {
        self.state.lock().set_at.len()
    }

    /// Keys held for `tenant`, expired or not.
    pub fn tenant_len(&self, tenant: &T) -> usize {
        self.state
            .lock()
            .set_at
            .get(tenant)
            .map_or(0, |keys| keys.len())
    }

    /// Keys across all tenants, expired or not.
    pub fn len(&self) -> usize {
        self.state.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().set_at.is_empty()
    }

    /// Runs one sweep now; returns how many entries were removed.
    pub fn purge_expired(&self) -> usize {
        self.state.lock().sweep(self.ttl)
    }

    /// Starts a background sweep every `interval`; zero gives an idle handle.
    pub fn start_sweep(&self, interval: Duration) -> Result<Sweeper, CacheError>
    where
        T: Send + 'static,
        K: Send + 'static,
        V: Send + Sync + 'static,
    {
        let weak: Weak<Mutex<ShardedState<T, K, V>>> = Arc::downgrade(&self.state);
        let ttl = self.ttl;
        debug!(?ttl, ?interval, "starting sharded ttl sweep");
        Sweeper::spawn("evictkit-sharded-sweep", interval, move || {
            let Some(state) = weak.upgrade() else {
                return ControlFlow::Break(());
            };
            let removed = state.lock().sweep(ttl);
            trace!(removed, "sharded sweep tick");
            ControlFlow::Continue(())
        })
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        let state = self.state.lock();
        assert_eq!(state.set_at.len(), state.data.tenant_count());
        for (tenant, keys) in &state.set_at {
            assert!(!keys.is_empty(), "empty tenant left in timing map");
            assert_eq!(keys.len(), state.data.tenant_len(tenant));
            for key in keys.keys() {
                assert!(state.data.contains(tenant, key));
            }
        }
    }
}

impl<T, K, V> ConcurrentCache<(T, K), V> for ShardedTtlCache<T, K, V>
where
    T: Eq + Hash + Clone + Send,
    K: Eq + Hash + Clone + Send,
    V: Send + Sync,
{
    fn get(&self, key: &(T, K)) -> Result<Arc<V>, CacheError> {
        ShardedTtlCache::get(self, &key.0, &key.1)
    }

    fn set(&self, (tenant, key): (T, K), value: V) -> Result<(), CacheError> {
        ShardedTtlCache::set(self, tenant, key, value)
    }

    fn delete(&self, key: &(T, K)) -> Result<(), CacheError> {
        ShardedTtlCache::delete(self, &key.0, &key.1)
    }

    fn set_nx(&self, (tenant, key): (T, K), value: V) -> Result<bool, CacheError> {
        ShardedTtlCache::set_nx(self, tenant, key, value)
    }
}

impl<T, K, V> Cache<(T, K), V> for ShardedTtlCache<T, K, V>
where
    T: Eq + Hash + Clone,
    K: Eq + Hash + Clone,
{
    fn get(&mut self, key: &(T, K)) -> Result<Arc<V>, CacheError> {
        ShardedTtlCache::get(self, &key.0, &key.1)
    }

    fn set(&mut self, (tenant, key): (T, K), value: V) -> Result<(), CacheError> {
        ShardedTtlCache::set(self, tenant, key, value)
    }

    fn delete(&mut self, key: &(T, K)) -> Result<(), CacheError> {
        ShardedTtlCache::delete(self, &key.0, &key.1)
    }

    fn contains(&self, key: &(T, K)) -> bool {
        ShardedTtlCache::contains(self, &key.0, &key.1)
    }

    fn len(&self) -> usize {
        ShardedTtlCache::len(self)
    }

    fn set_nx(&mut self, (tenant, key): (T, K), value: V) -> Result<bool, CacheError> {
        ShardedTtlCache::set_nx(self, tenant, key, value)
    }
}

impl<T, K, V> fmt::Debug for ShardedTtlCache<T, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShardedTtlCache")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
