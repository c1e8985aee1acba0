//! Construction settings shared by every engine.
//!
//! `CacheConfig` is plain data: deserialize it from whatever format the
//! application already uses, then hand it to
//! [`CacheBuilder::from_config`](crate::builder::CacheBuilder::from_config).
//!
//! ```
//! use std::time::Duration;
//!
//! use evictkit::config::CacheConfig;
//!
//! let config = CacheConfig {
//!     capacity: 512,
//!     ttl_ms: 30_000,
//!     ..CacheConfig::default()
//! };
//! config.validate().unwrap();
//! assert_eq!(config.ttl(), Duration::from_secs(30));
//! assert!(config.gc_interval().is_zero());
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::builder::CachePolicy;
use crate::durable::{DEFAULT_COLLECTION, DEFAULT_TTL, DurableOptions};
use crate::error::ConfigError;

pub const DEFAULT_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Eviction policy for bounded engines.
    pub policy: CachePolicy,
    /// Maximum entries for LRU and LFU. Must be at least 1.
    pub capacity: usize,
    /// Entry lifetime in milliseconds. 0 means never expire.
    pub ttl_ms: u64,
    /// Background sweep period in milliseconds. 0 disables the sweep.
    pub gc_interval_ms: u64,
    /// Durable backend collection.
    pub collection_name: String,
}

impl CacheConfig {
    /// # Errors
    ///
    /// [`ConfigError`] for a zero capacity or an empty collection name.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_capacity(self.capacity)?;
        if self.collection_name.is_empty() {
            return Err(ConfigError::new("collection_name must not be empty"));
        }
        Ok(())
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    pub fn gc_interval(&self) -> Duration {
        Duration::from_millis(self.gc_interval_ms)
    }

    pub fn durable_options(&self) -> DurableOptions {
        DurableOptions::default()
            .with_ttl(self.ttl())
            .with_collection_name(self.collection_name.clone())
            .with_gc_interval(self.gc_interval())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            policy: CachePolicy::default(),
            capacity: DEFAULT_CAPACITY,
            ttl_ms: DEFAULT_TTL.as_millis() as u64,
            gc_interval_ms: 0,
            collection_name: DEFAULT_COLLECTION.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = CacheConfig::default();
        config.validate().unwrap();
        assert_eq!(config.policy, CachePolicy::Lru);
        assert_eq!(config.ttl(), Duration::from_secs(60));
        assert_eq!(config.collection_name, "jKeyValue");
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = CacheConfig {
            capacity: 0,
            ..CacheConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.message().contains("capacity"));
    }

    #[test]
    fn test_empty_collection_rejected() {
        let config = CacheConfig {
            collection_name: String::new(),
            ..CacheConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_durable_options_follow_config() {
        let config = CacheConfig {
            ttl_ms: 0,
            gc_interval_ms: 250,
            collection_name: "sessions".into(),
            ..CacheConfig::default()
        };
        let options = config.durable_options();
        assert!(options.ttl.is_zero());
        assert_eq!(options.gc_interval, Duration::from_millis(250));
        assert_eq!(options.collection_name, "sessions");
    }

    #[test]
    fn test_from_toml_with_partial_fields() {
        let config: CacheConfig = toml::from_str(
            r#"
            policy = "lfu"
            capacity = 8
            "#,
        )
        .unwrap();
        assert_eq!(config.policy, CachePolicy::Lfu);
        assert_eq!(config.capacity, 8);
        assert_eq!(config.ttl_ms, 60_000);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let parsed = toml::from_str::<CacheConfig>("capacity = 8\nsize = 3\n");
        assert!(parsed.is_err());
    }
}
