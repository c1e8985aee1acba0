//! Durable backend adapter.
//!
//! Puts the [`ConcurrentCache`] contract in front of a document database.
//! Every entry is one [`KeyValueRecord`] in a named collection; expiry is
//! stored as an absolute `expire_at` so that any process sharing the
//! collection agrees on it.
//!
//! ```text
//!   DurableCache<S, V>
//!   ┌──────────────────────────────────────────────────────────────┐
//!   │ options: ttl, collection_name, gc_interval                   │
//!   │ store:   Arc<S: DocumentStore<V>>                            │
//!   └──────────────┬───────────────────────────────────────────────┘
//!                  │ find / upsert / remove / remove_expired
//!                  ▼
//!   ┌──────────────────────────────────────────────────────────────┐
//!   │ collection "jKeyValue"                                       │
//!   │   { key, value, createdAt, expireAt }                        │
//!   │   { key, value, createdAt, expireAt }                        │
//!   └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! A read that finds an expired record deletes it and reports
//! [`CacheError::NotFound`]. Backend failures surface as
//! [`CacheError::Backend`] and are never folded into a miss.
//!
//! [`InMemoryDocumentStore`] is a process-local backend for tests and
//! single-node use.

mod memory;
mod record;

use std::fmt;
use std::marker::PhantomData;
use std::ops::ControlFlow;
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, warn};

pub use memory::InMemoryDocumentStore;
pub use record::KeyValueRecord;

use crate::error::{CacheError, ConfigError};
use crate::sweep::Sweeper;
use crate::traits::ConcurrentCache;

/// Default collection holding the cache documents.
pub const DEFAULT_COLLECTION: &str = "jKeyValue";

/// Default entry lifetime.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

// ---------------------------------------------------------------------------
// DocumentStore
// ---------------------------------------------------------------------------

/// Collection-scoped document operations the adapter needs from a backend.
///
/// Implementations are shared across threads and called through `&self`;
/// they do their own locking or connection pooling.
pub trait DocumentStore<V>: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetches the record stored under `key`, if any.
    fn find(&self, collection: &str, key: &str) -> Result<Option<KeyValueRecord<V>>, Self::Error>;

    /// Inserts or replaces the record keyed by `record.key`.
    fn upsert(&self, collection: &str, record: KeyValueRecord<V>) -> Result<(), Self::Error>;

    /// Removes the record under `key`; `Ok(false)` if there was none.
    fn remove(&self, collection: &str, key: &str) -> Result<bool, Self::Error>;

    /// Removes the record under `key` only if it is expired at `now`.
    ///
    /// Must check and delete as one step, so a fresh record written by
    /// someone else in the meantime survives (for a document database: a
    /// delete filtered on `{key, expireAt: {$lte: now}}`).
    fn remove_if_expired(
        &self,
        collection: &str,
        key: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, Self::Error>;

    /// Removes every record whose `expire_at` is at or before `now`.
    fn remove_expired(&self, collection: &str, now: DateTime<Utc>) -> Result<u64, Self::Error>;
}

// ---------------------------------------------------------------------------
// DurableOptions
// ---------------------------------------------------------------------------

/// Settings for a [`DurableCache`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DurableOptions {
    /// Lifetime of each entry. Zero means entries never expire.
    pub ttl: Duration,
    pub collection_name: String,
    /// Period of the background sweep. Zero disables it.
    pub gc_interval: Duration,
}

impl DurableOptions {
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_collection_name(mut self, name: impl Into<String>) -> Self {
        self.collection_name = name.into();
        self
    }

    pub fn with_gc_interval(mut self, interval: Duration) -> Self {
        self.gc_interval = interval;
        self
    }
}

impl Default for DurableOptions {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            collection_name: DEFAULT_COLLECTION.to_owned(),
            gc_interval: Duration::ZERO,
        }
    }
}

// ---------------------------------------------------------------------------
// DurableCache
// ---------------------------------------------------------------------------

/// String-keyed cache persisted in a [`DocumentStore`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use evictkit::durable::{DurableCache, DurableOptions, InMemoryDocumentStore};
/// use evictkit::traits::ConcurrentCache;
///
/// let store = Arc::new(InMemoryDocumentStore::new());
/// let cache = DurableCache::new(store, DurableOptions::default()).unwrap();
///
/// cache.set("session:1".to_string(), 42u32).unwrap();
/// assert_eq!(*cache.get(&"session:1".to_string()).unwrap(), 42);
///
/// cache.delete(&"session:1".to_string()).unwrap();
/// assert!(cache.get(&"session:1".to_string()).unwrap_err().is_not_found());
/// ```
pub struct DurableCache<S, V> {
    store: Arc<S>,
    options: DurableOptions,
    ttl: Option<TimeDelta>,
    _values: PhantomData<fn() -> V>,
}

impl<S, V> DurableCache<S, V>
where
    S: DocumentStore<V>,
{
    /// # Errors
    ///
    /// [`ConfigError`] if the collection name is empty or the TTL does not
    /// fit in a signed time delta.
    pub fn new(store: Arc<S>, options: DurableOptions) -> Result<Self, ConfigError> {
        if options.collection_name.is_empty() {
            return Err(ConfigError::new("collection name must not be empty"));
        }
        let ttl = if options.ttl.is_zero() {
            None
        } else {
            let delta = TimeDelta::from_std(options.ttl)
                .map_err(|_| ConfigError::new(format!("ttl {:?} is out of range", options.ttl)))?;
            Some(delta)
        };
        Ok(Self {
            store,
            options,
            ttl,
            _values: PhantomData,
        })
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn options(&self) -> &DurableOptions {
        &self.options
    }

    fn collection(&self) -> &str {
        &self.options.collection_name
    }

    /// Deletes every expired record now; returns how many went.
    pub fn purge_expired(&self) -> Result<u64, CacheError> {
        self.store
            .remove_expired(self.collection(), Utc::now())
            .map_err(CacheError::backend)
    }

    /// Starts the periodic `remove_expired` sweep at `gc_interval`.
    ///
    /// Returns an idle handle when `gc_interval` is zero. The sweep only
    /// holds a weak reference to the store; stopping it leaves the store
    /// untouched.
    pub fn start_sweep(&self) -> Result<Sweeper, CacheError>
    where
        S: 'static,
        V: 'static,
    {
        let weak: Weak<S> = Arc::downgrade(&self.store);
        let collection = self.options.collection_name.clone();
        let interval = self.options.gc_interval;
        debug!(%collection, ?interval, "starting durable sweep");
        Sweeper::spawn("evictkit-durable-sweep", interval, move || {
            let Some(store) = weak.upgrade() else {
                return ControlFlow::Break(());
            };
            match store.remove_expired(&collection, Utc::now()) {
                Ok(0) => {},
                Ok(removed) => {
                    debug!(%collection, removed, "durable sweep removed expired records");
                },
                Err(err) => warn!(%collection, error = %err, "durable sweep failed"),
            }
            ControlFlow::Continue(())
        })
    }

    fn find_live(&self, key: &str) -> Result<Option<KeyValueRecord<V>>, CacheError> {
        let Some(record) = self
            .store
            .find(self.collection(), key)
            .map_err(CacheError::backend)?
        else {
            return Ok(None);
        };
        let now = Utc::now();
        if record.is_expired(now) {
            self.store
                .remove_if_expired(self.collection(), key, now)
                .map_err(CacheError::backend)?;
            return Ok(None);
        }
        Ok(Some(record))
    }
}

impl<S, V> ConcurrentCache<String, V> for DurableCache<S, V>
where
    S: DocumentStore<V>,
{
    fn get(&self, key: &String) -> Result<Arc<V>, CacheError> {
        self.find_live(key)?
            .map(|record| Arc::new(record.value))
            .ok_or(CacheError::NotFound)
    }

    fn set(&self, key: String, value: V) -> Result<(), CacheError> {
        let record = KeyValueRecord::new(key, value, Utc::now(), self.ttl);
        self.store
            .upsert(self.collection(), record)
            .map_err(CacheError::backend)
    }

    fn delete(&self, key: &String) -> Result<(), CacheError> {
        self.store
            .remove(self.collection(), key)
            .map(|_| ())
            .map_err(CacheError::backend)
    }

    fn set_nx(&self, key: String, value: V) -> Result<bool, CacheError> {
        // Check-then-write: two processes can both win.
        if self.find_live(&key)?.is_some() {
            return Ok(false);
        }
        ConcurrentCache::set(self, key, value)?;
        Ok(true)
    }
}

impl<S, V> fmt::Debug for DurableCache<S, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DurableCache")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
