//! The document persisted for each durable cache entry.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// One key/value document as stored by a [`DocumentStore`](super::DocumentStore).
///
/// `expire_at` is an absolute deadline. `None` means the entry never expires.
///
/// # Example
///
/// ```
/// use chrono::{TimeDelta, Utc};
/// use evictkit::durable::KeyValueRecord;
///
/// let now = Utc::now();
/// let record = KeyValueRecord::new("greeting", "hello", now, Some(TimeDelta::seconds(60)));
/// assert!(!record.is_expired(now));
/// assert!(record.is_expired(now + TimeDelta::seconds(60)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyValueRecord<V> {
    pub key: String,
    pub value: V,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expire_at: Option<DateTime<Utc>>,
}

impl<V> KeyValueRecord<V> {
    /// Builds a record created at `now` that lives for `ttl` (`None`: forever).
    pub fn new(
        key: impl Into<String>,
        value: V,
        now: DateTime<Utc>,
        ttl: Option<TimeDelta>,
    ) -> Self {
        Self {
            key: key.into(),
            value,
            created_at: now,
            // Past the representable range is as good as never.
            expire_at: ttl.and_then(|ttl| now.checked_add_signed(ttl)),
        }
    }

    /// `true` once `now` has reached `expire_at`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expire_at.is_some_and(|deadline| now >= deadline)
    }
}
