//! Process-local [`DocumentStore`].

use std::convert::Infallible;
use std::fmt;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use super::{DocumentStore, KeyValueRecord};

type Collection<V> = FxHashMap<String, KeyValueRecord<V>>;

/// Collections of records kept in a hash map behind one mutex.
pub struct InMemoryDocumentStore<V> {
    collections: Mutex<FxHashMap<String, Collection<V>>>,
}

impl<V> InMemoryDocumentStore<V> {
    pub fn new() -> Self {
        Self {
            collections: Mutex::new(FxHashMap::default()),
        }
    }

    /// Number of records in `collection`, expired ones included.
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .lock()
            .get(collection)
            .map_or(0, |records| records.len())
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }
}

impl<V> Default for InMemoryDocumentStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for InMemoryDocumentStore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let collections = self.collections.lock();
        f.debug_struct("InMemoryDocumentStore")
            .field("collections", &collections.len())
            .finish()
    }
}

impl<V> DocumentStore<V> for InMemoryDocumentStore<V>
where
    V: Clone + Send,
{
    type Error = Infallible;

    fn find(&self, collection: &str, key: &str) -> Result<Option<KeyValueRecord<V>>, Self::Error> {
        Ok(self
            .collections
            .lock()
            .get(collection)
            .and_then(|records| records.get(key))
            .cloned())
    }

    fn upsert(&self, collection: &str, record: KeyValueRecord<V>) -> Result<(), Self::Error> {
        self.collections
            .lock()
            .entry(collection.to_owned())
            .or_default()
            .insert(record.key.clone(), record);
        Ok(())
    }

    fn remove(&self, collection: &str, key: &str) -> Result<bool, Self::Error> {
        let mut collections = self.collections.lock();
        let Some(records) = collections.get_mut(collection) else {
            return Ok(false);
        };
        Ok(records.remove(key).is_some())
    }

    fn remove_if_expired(
        &self,
        collection: &str,
        key: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, Self::Error> {
        let mut collections = self.collections.lock();
        let Some(records) = collections.get_mut(collection) else {
            return Ok(false);
        };
        if !records.get(key).is_some_and(|record| record.is_expired(now)) {
            return Ok(false);
        }
        Ok(records.remove(key).is_some())
    }

    fn remove_expired(&self, collection: &str, now: DateTime<Utc>) -> Result<u64, Self::Error> {
        let mut collections = self.collections.lock();
        let Some(records) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = records.len();
        records.retain(|_, record| !record.is_expired(now));
        Ok((before - records.len()) as u64)
    }
}
