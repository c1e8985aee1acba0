//! Unified cache builder for every engine.
//!
//! Picks the eviction policy at runtime and layers the decorators on top,
//! so callers can go from a [`CacheConfig`] to a working cache without
//! naming the concrete engine types.
//!
//! ```text
//!   CacheConfig ──► CacheBuilder ──┬─ build()              → PolicyCache (LRU | LFU)
//!                                  ├─ build_ttl()          → TtlCache<PolicyCache>
//!                                  ├─ build_synchronized() → Synchronized<PolicyCache>
//!                                  ├─ build_sharded()      → ShardedTtlCache
//!                                  └─ build_durable(store) → DurableCache
//! ```
//!
//! ## Example
//!
//! ```rust
//! use evictkit::builder::{CacheBuilder, CachePolicy};
//! use evictkit::traits::Cache;
//!
//! let mut cache = CacheBuilder::new(100)
//!     .policy(CachePolicy::Lfu)
//!     .build::<u64, String>()
//!     .unwrap();
//! cache.set(1, "hello".to_string()).unwrap();
//! assert_eq!(cache.get(&1).unwrap().as_str(), "hello");
//! ```

use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::CacheConfig;
use crate::durable::{DocumentStore, DurableCache};
use crate::error::{CacheError, ConfigError};
use crate::policy::lfu::LfuCache;
use crate::policy::lru::LruCache;
use crate::policy::sharded::ShardedTtlCache;
use crate::policy::synchronized::Synchronized;
use crate::policy::ttl::TtlCache;
use crate::traits::Cache;

/// Available bounded eviction policies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CachePolicy {
    /// Least Recently Used eviction.
    #[default]
    Lru,
    /// Least Frequently Used eviction, ties broken by age.
    Lfu,
}

/// A bounded engine whose policy was chosen at runtime.
pub struct PolicyCache<K, V>
where
    K: Eq + Hash + Clone,
{
    inner: PolicyInner<K, V>,
}

enum PolicyInner<K, V>
where
    K: Eq + Hash + Clone,
{
    Lru(LruCache<K, V>),
    Lfu(LfuCache<K, V>),
}

impl<K, V> PolicyCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new(policy: CachePolicy, capacity: usize) -> Result<Self, ConfigError> {
        let inner = match policy {
            CachePolicy::Lru => PolicyInner::Lru(LruCache::new(capacity)?),
            CachePolicy::Lfu => PolicyInner::Lfu(LfuCache::new(capacity)?),
        };
        Ok(Self { inner })
    }

    pub fn policy(&self) -> CachePolicy {
        match &self.inner {
            PolicyInner::Lru(_) => CachePolicy::Lru,
            PolicyInner::Lfu(_) => CachePolicy::Lfu,
        }
    }

    pub fn capacity(&self) -> usize {
        match &self.inner {
            PolicyInner::Lru(lru) => lru.capacity(),
            PolicyInner::Lfu(lfu) => lfu.capacity(),
        }
    }

    /// Reads a value without touching recency or frequency.
    pub fn peek(&self, key: &K) -> Option<Arc<V>> {
        match &self.inner {
            PolicyInner::Lru(lru) => lru.peek(key),
            PolicyInner::Lfu(lfu) => lfu.peek(key),
        }
    }

    pub fn clear(&mut self) {
        match &mut self.inner {
            PolicyInner::Lru(lru) => lru.clear(),
            PolicyInner::Lfu(lfu) => lfu.clear(),
        }
    }
}

impl<K, V> Cache<K, V> for PolicyCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn get(&mut self, key: &K) -> Result<Arc<V>, CacheError> {
        match &mut self.inner {
            PolicyInner::Lru(lru) => lru.get(key),
            PolicyInner::Lfu(lfu) => lfu.get(key),
        }
    }

    fn set(&mut self, key: K, value: V) -> Result<(), CacheError> {
        match &mut self.inner {
            PolicyInner::Lru(lru) => lru.set(key, value),
            PolicyInner::Lfu(lfu) => lfu.set(key, value),
        }
    }

    fn delete(&mut self, key: &K) -> Result<(), CacheError> {
        match &mut self.inner {
            PolicyInner::Lru(lru) => lru.delete(key),
            PolicyInner::Lfu(lfu) => lfu.delete(key),
        }
    }

    fn contains(&self, key: &K) -> bool {
        match &self.inner {
            PolicyInner::Lru(lru) => lru.contains(key),
            PolicyInner::Lfu(lfu) => lfu.contains(key),
        }
    }

    fn len(&self) -> usize {
        match &self.inner {
            PolicyInner::Lru(lru) => lru.len(),
            PolicyInner::Lfu(lfu) => lfu.len(),
        }
    }

    fn set_nx(&mut self, key: K, value: V) -> Result<bool, CacheError> {
        match &mut self.inner {
            PolicyInner::Lru(lru) => lru.set_nx(key, value),
            PolicyInner::Lfu(lfu) => lfu.set_nx(key, value),
        }
    }
}

impl<K, V> std::fmt::Debug for PolicyCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyCache")
            .field("policy", &self.policy())
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}

/// Builder for creating cache instances.
#[derive(Debug, Clone, Default)]
pub struct CacheBuilder {
    config: CacheConfig,
}

impl CacheBuilder {
    /// Starts from the default config with the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            config: CacheConfig {
                capacity,
                ..CacheConfig::default()
            },
        }
    }

    pub fn from_config(config: CacheConfig) -> Self {
        Self { config }
    }

    pub fn policy(mut self, policy: CachePolicy) -> Self {
        self.config.policy = policy;
        self
    }

    pub fn capacity(mut self, capacity: usize) -> Self {
        self.config.capacity = capacity;
        self
    }

    /// Entry lifetime for TTL, sharded and durable engines. Zero: forever.
    ///
    /// Stored in whole milliseconds, rounded up, so any positive lifetime
    /// stays positive.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.config.ttl_ms = millis_round_up(ttl);
        self
    }

    /// Background sweep period. Zero disables it. Rounded up like
    /// [`CacheBuilder::ttl`].
    pub fn gc_interval(mut self, interval: Duration) -> Self {
        self.config.gc_interval_ms = millis_round_up(interval);
        self
    }

    pub fn collection_name(mut self, name: impl Into<String>) -> Self {
        self.config.collection_name = name.into();
        self
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Interval to pass to `start_sweep` on the built engine.
    pub fn sweep_interval(&self) -> Duration {
        self.config.gc_interval()
    }

    /// A bare LRU or LFU engine.
    ///
    /// # Example
    ///
    /// ```rust
    /// use evictkit::builder::{CacheBuilder, CachePolicy};
    ///
    /// let lru = CacheBuilder::new(100).build::<u64, String>().unwrap();
    /// assert_eq!(lru.policy(), CachePolicy::Lru);
    ///
    /// assert!(CacheBuilder::new(0).build::<u64, String>().is_err());
    /// ```
    pub fn build<K, V>(&self) -> Result<PolicyCache<K, V>, ConfigError>
    where
        K: Eq + Hash + Clone,
    {
        self.config.validate()?;
        PolicyCache::new(self.config.policy, self.config.capacity)
    }

    /// The bounded engine wrapped in a TTL decorator.
    pub fn build_ttl<K, V>(&self) -> Result<TtlCache<K, V, PolicyCache<K, V>>, ConfigError>
    where
        K: Eq + Hash + Clone,
    {
        Ok(TtlCache::new(self.build()?, self.config.ttl()))
    }

    /// The bounded engine behind one lock.
    pub fn build_synchronized<K, V>(&self) -> Result<Synchronized<PolicyCache<K, V>>, ConfigError>
    where
        K: Eq + Hash + Clone,
    {
        Ok(Synchronized::new(self.build()?))
    }

    /// An unbounded multi-tenant TTL engine.
    ///
    /// Only the ttl is read: capacity, policy and collection settings are
    /// ignored and never rejected here.
    pub fn build_sharded<T, K, V>(&self) -> ShardedTtlCache<T, K, V>
    where
        T: Eq + Hash + Clone,
        K: Eq + Hash + Clone,
    {
        ShardedTtlCache::new(self.config.ttl())
    }

    /// A durable adapter over `store`.
    pub fn build_durable<S, V>(&self, store: Arc<S>) -> Result<DurableCache<S, V>, ConfigError>
    where
        S: DocumentStore<V>,
    {
        self.config.validate()?;
        DurableCache::new(store, self.config.durable_options())
    }
}

/// Whole milliseconds, never rounding a positive duration down to zero.
fn millis_round_up(duration: Duration) -> u64 {
    let millis = duration.as_millis() + u128::from(duration.subsec_nanos() % 1_000_000 != 0);
    u64::try_from(millis).unwrap_or(u64::MAX)
}
