//! # Cache Capability Traits
//!
//! Every engine in the crate is reachable through one of two traits that share
//! the same Get/Set/Delete contract and differ only in how callers get access.
//!
//! ## Architecture
//!
//! ```text
//!   ┌─────────────────────────────────────────┐   ┌──────────────────────────────────────────┐
//!   │            Cache<K, V>                  │   │        ConcurrentCache<K, V>             │
//!   │   (exclusive access, &mut self)         │   │   (shared access, &self, Send + Sync)    │
//!   │                                         │   │                                          │
//!   │  get(&K)      → Result<Arc<V>>          │   │  get(&K)      → Result<Arc<V>>           │
//!   │  set(K, V)    → Result<()>              │   │  set(K, V)    → Result<()>               │
//!   │  delete(&K)   → Result<()>              │   │  delete(&K)   → Result<()>               │
//!   │  set_nx(K, V) → Result<bool>            │   │  set_nx(K, V) → Result<bool>             │
//!   │  contains / len / is_empty              │   │                                          │
//!   └────────────────────┬────────────────────┘   └─────────────────────┬────────────────────┘
//!                        │                                              │
//!        MemoryStore, LruCache, LfuCache          Synchronized<C>, TtlCache, ShardedTtlCache,
//!        (+ every decorator, for nesting)         DurableCache
//! ```
//!
//! ## Contract
//!
//! | Operation | Absent key              | Present key                         |
//! |-----------|-------------------------|-------------------------------------|
//! | `get`     | `Err(NotFound)`         | `Ok(value)`                         |
//! | `set`     | insert                  | overwrite                           |
//! | `delete`  | `Ok(())`, no change     | remove                              |
//! | `set_nx`  | insert, `Ok(true)`      | untouched, `Ok(false)`              |
//!
//! Values come back as `Arc<V>`. Store `Option<T>` to keep a legitimate
//! "null" that is distinguishable from a miss.
//!
//! ## Example Usage
//!
//! ```
//! use evictkit::error::CacheError;
//! use evictkit::policy::lfu::LfuCache;
//! use evictkit::policy::lru::LruCache;
//! use evictkit::traits::Cache;
//!
//! fn warm<C: Cache<u64, String>>(cache: &mut C, data: &[(u64, &str)]) -> Result<(), CacheError> {
//!     for (key, value) in data {
//!         cache.set(*key, value.to_string())?;
//!     }
//!     Ok(())
//! }
//!
//! let mut lru = LruCache::new(10).unwrap();
//! let mut lfu = LfuCache::new(10).unwrap();
//! warm(&mut lru, &[(1, "one"), (2, "two")]).unwrap();
//! warm(&mut lfu, &[(1, "one"), (2, "two")]).unwrap();
//! assert_eq!(lru.len(), 2);
//! assert_eq!(lfu.get(&1).unwrap().as_str(), "one");
//! ```
//!
//! ## Thread Safety
//!
//! - `Cache` implementations are single-threaded unless they also implement
//!   `ConcurrentCache`.
//! - Wrap any `Cache` in [`Synchronized`](crate::policy::synchronized::Synchronized)
//!   to share it across threads.

use std::sync::Arc;

use crate::error::CacheError;

/// Capability contract for caches used through exclusive access.
///
/// # Example
///
/// ```
/// use evictkit::policy::lru::LruCache;
/// use evictkit::traits::Cache;
///
/// let mut cache = LruCache::new(2).unwrap();
/// cache.set("a", 1).unwrap();
/// assert_eq!(*cache.get(&"a").unwrap(), 1);
///
/// cache.delete(&"a").unwrap();
/// cache.delete(&"a").unwrap(); // absent keys are fine
/// assert!(cache.get(&"a").unwrap_err().is_not_found());
/// ```
pub trait Cache<K, V> {
    /// Returns the value for `key`, or [`CacheError::NotFound`].
    fn get(&mut self, key: &K) -> Result<Arc<V>, CacheError>;

    /// Inserts or overwrites `key`.
    fn set(&mut self, key: K, value: V) -> Result<(), CacheError>;

    /// Removes `key`. Never fails because the key was absent.
    fn delete(&mut self, key: &K) -> Result<(), CacheError>;

    /// Returns `true` if `key` is currently readable, without touching
    /// recency or frequency metadata.
    fn contains(&self, key: &K) -> bool;

    /// Number of tracked entries.
    fn len(&self) -> usize;

    /// Returns `true` if nothing is tracked.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Inserts only if `key` is absent. Returns whether the insert happened.
    ///
    /// An existing entry is left exactly as it was, including its position in
    /// any recency or frequency order.
    fn set_nx(&mut self, key: K, value: V) -> Result<bool, CacheError> {
        if self.contains(&key) {
            return Ok(false);
        }
        self.set(key, value)?;
        Ok(true)
    }
}

/// Capability contract for caches that guard their own state and can be
/// shared between threads.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::thread;
///
/// use evictkit::policy::lru::LruCache;
/// use evictkit::policy::synchronized::Synchronized;
/// use evictkit::traits::ConcurrentCache;
///
/// let cache = Arc::new(Synchronized::new(LruCache::new(100).unwrap()));
/// let writer = Arc::clone(&cache);
/// thread::spawn(move || writer.set(1u64, "one".to_string()).unwrap())
///     .join()
///     .unwrap();
/// assert_eq!(cache.get(&1).unwrap().as_str(), "one");
/// ```
pub trait ConcurrentCache<K, V>: Send + Sync {
    /// Returns the value for `key`, or [`CacheError::NotFound`].
    fn get(&self, key: &K) -> Result<Arc<V>, CacheError>;

    /// Inserts or overwrites `key`.
    fn set(&self, key: K, value: V) -> Result<(), CacheError>;

    /// Removes `key`. Never fails because the key was absent.
    fn delete(&self, key: &K) -> Result<(), CacheError>;

    /// Inserts only if `key` is absent. Returns whether the insert happened.
    fn set_nx(&self, key: K, value: V) -> Result<bool, CacheError>;
}
