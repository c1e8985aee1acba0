//! Thread-safe wrapper for any [`Cache`] engine.
//!
//! ```text
//!   Thread 1           Thread 2           Thread 3
//!      │                  │                  │
//!      │ get(k1)          │ get(k2)          │ set(k3, v)
//!      ▼                  ▼                  ▼
//!   ┌──────────────────────────────────────────────────────────┐
//!   │                parking_lot::Mutex<C>                     │
//!   │                                                          │
//!   │  Every operation takes the lock exclusively: even a      │
//!   │  get moves the entry (LRU) or bumps its count (LFU).     │
//!   └──────────────────────────────────────────────────────────┘
//!        │
//!        ▼
//!   ┌──────────────────────────────────────────────────────────┐
//!   │  C: LruCache / LfuCache / TtlCache / ... (single-thread) │
//!   └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Use [`Synchronized::with_lock`] to run several operations as one atomic
//! step.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::CacheError;
use crate::traits::{Cache, ConcurrentCache};

/// A [`Cache`] behind one exclusive lock.
///
/// # Example
///
/// ```
/// use evictkit::policy::lfu::LfuCache;
/// use evictkit::policy::synchronized::Synchronized;
/// use evictkit::traits::ConcurrentCache;
///
/// let cache = Synchronized::new(LfuCache::new(16).unwrap());
/// cache.set("a", 1).unwrap();
///
/// // Read-modify-write without another thread slipping in between.
/// let bumped = cache.with_lock(|inner| {
///     use evictkit::traits::Cache;
///     let current = *inner.get(&"a")?;
///     inner.set("a", current + 1)?;
///     Ok::<_, evictkit::error::CacheError>(current + 1)
/// });
/// assert_eq!(bumped.unwrap(), 2);
/// ```
pub struct Synchronized<C> {
    inner: Mutex<C>,
}

impl<C> Synchronized<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner: Mutex::new(inner),
        }
    }

    /// Runs `f` with exclusive access to the engine.
    pub fn with_lock<R>(&self, f: impl FnOnce(&mut C) -> R) -> R {
        f(&mut self.inner.lock())
    }

    pub fn into_inner(self) -> C {
        self.inner.into_inner()
    }

    /// Direct access when the wrapper itself is held exclusively.
    pub fn get_mut(&mut self) -> &mut C {
        self.inner.get_mut()
    }
}

impl<C, K, V> ConcurrentCache<K, V> for Synchronized<C>
where
    C: Cache<K, V> + Send,
{
    fn get(&self, key: &K) -> Result<Arc<V>, CacheError> {
        self.inner.lock().get(key)
    }

    fn set(&self, key: K, value: V) -> Result<(), CacheError> {
        self.inner.lock().set(key, value)
    }

    fn delete(&self, key: &K) -> Result<(), CacheError> {
        self.inner.lock().delete(key)
    }

    fn set_nx(&self, key: K, value: V) -> Result<bool, CacheError> {
        self.inner.lock().set_nx(key, value)
    }
}

impl<C, K, V> Cache<K, V> for Synchronized<C>
where
    C: Cache<K, V>,
{
    fn get(&mut self, key: &K) -> Result<Arc<V>, CacheError> {
        self.inner.get_mut().get(key)
    }

    fn set(&mut self, key: K, value: V) -> Result<(), CacheError> {
        self.inner.get_mut().set(key, value)
    }

    fn delete(&mut self, key: &K) -> Result<(), CacheError> {
        self.inner.get_mut().delete(key)
    }

    fn contains(&self, key: &K) -> bool {
        self.inner.lock().contains(key)
    }

    fn len(&self) -> usize {
        self.inner.lock().len()
    }

    fn set_nx(&mut self, key: K, value: V) -> Result<bool, CacheError> {
        self.inner.get_mut().set_nx(key, value)
    }
}

impl<C: fmt::Debug> fmt::Debug for Synchronized<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Synchronized")
            .field("inner", &*self.inner.lock())
            .finish()
    }
}
