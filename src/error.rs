//! Error types for the evictkit library.
//!
//! ## Key Components
//!
//! - [`CacheError`]: Returned by every cache operation. `NotFound` is the
//!   expected, recoverable miss; the other variants are real failures.
//! - [`ConfigError`]: Returned when cache configuration parameters are invalid
//!   (e.g. zero capacity).
//!
//! ## Example Usage
//!
//! ```
//! use evictkit::error::{CacheError, ConfigError};
//! use evictkit::policy::lru::LruCache;
//!
//! // Fallible constructor for user-configurable parameters
//! let cache: Result<LruCache<String, i32>, ConfigError> = LruCache::new(100);
//! assert!(cache.is_ok());
//!
//! // Zero capacity is caught without panicking
//! let bad = LruCache::<String, i32>::new(0);
//! assert!(bad.is_err());
//!
//! // Misses are ordinary values, not panics
//! let mut cache: LruCache<&str, i32> = LruCache::new(1).unwrap();
//! use evictkit::traits::Cache;
//! assert!(matches!(cache.get(&"missing"), Err(CacheError::NotFound)));
//! ```

use std::fmt;

// ---------------------------------------------------------------------------
// CacheError
// ---------------------------------------------------------------------------

/// Error returned by cache operations.
///
/// `Delete` never produces [`CacheError::NotFound`]; only reads do.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CacheError {
    /// The key is absent or has expired.
    #[error("not found")]
    NotFound,

    /// Construction parameters were rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),

    /// The durable document store failed; carried unchanged.
    #[error("backend failure: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),

    /// A background sweep thread could not be started.
    #[error("failed to spawn sweeper thread: {0}")]
    Spawn(#[source] std::io::Error),
}

impl CacheError {
    /// Wraps a backend error.
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend(Box::new(err))
    }

    /// Returns `true` for the expected miss case.
    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when cache configuration parameters are invalid.
///
/// Produced by fallible constructors such as
/// [`LruCache::new`](crate::policy::lru::LruCache::new) and
/// [`CacheConfig::validate`](crate::config::CacheConfig::validate). Carries a
/// human-readable description of which parameter failed validation.
///
/// # Example
///
/// ```
/// use evictkit::policy::lfu::LfuCache;
///
/// let err = LfuCache::<u64, u64>::new(0).unwrap_err();
/// assert!(err.to_string().contains("capacity"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }

    pub(crate) fn check_capacity(capacity: usize) -> Result<usize, Self> {
        if capacity < 1 {
            return Err(Self::new(format!(
                "capacity must be at least 1, got {capacity}"
            )));
        }
        Ok(capacity)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- CacheError -------------------------------------------------------

    #[test]
    fn not_found_display() {
        assert_eq!(CacheError::NotFound.to_string(), "not found");
        assert!(CacheError::NotFound.is_not_found());
    }

    #[test]
    fn config_error_converts_into_cache_error() {
        let err: CacheError = ConfigError::new("capacity must be at least 1").into();
        assert!(matches!(err, CacheError::InvalidConfiguration(_)));
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("capacity"));
    }

    #[test]
    fn backend_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer");
        let err = CacheError::backend(io);
        let source = std::error::Error::source(&err).expect("source present");
        assert!(source.to_string().contains("reset by peer"));
    }

    #[test]
    fn cache_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + std::error::Error>() {}
        assert_send_sync::<CacheError>();
    }

    // -- ConfigError ------------------------------------------------------

    #[test]
    fn config_display_shows_message() {
        let err = ConfigError::new("capacity must be > 0");
        assert_eq!(err.to_string(), "capacity must be > 0");
        assert_eq!(err.message(), "capacity must be > 0");
    }

    #[test]
    fn check_capacity_rejects_zero() {
        assert!(ConfigError::check_capacity(0).is_err());
        assert_eq!(ConfigError::check_capacity(1), Ok(1));
    }
}
