//! Configuration for Redis backend

use serde::Deserialize;
use std::time::Duration;
use tagcache_core::DEFAULT_MAX_KEY_LENGTH;

/// Redis' own limit for string values
pub const REDIS_MAX_VALUE_SIZE: usize = 512 * 1024 * 1024;

/// Configuration for Redis backend connection and behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    /// Redis connection URL (e.g., "redis://127.0.0.1:6379")
    pub url: String,

    /// Connection pool size
    pub pool_size: u32,

    /// Connection timeout
    #[serde(rename = "connection_timeout_secs", with = "duration_secs")]
    pub connection_timeout: Duration,

    /// Maximum physical key length accepted by the engine
    pub max_key_length: usize,

    /// Maximum value size in bytes
    pub max_value_size: usize,

    /// Keys requested per SCAN round trip when enumerating a namespace
    pub scan_count: usize,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            pool_size: 10,
            connection_timeout: Duration::from_secs(5),
            max_key_length: DEFAULT_MAX_KEY_LENGTH,
            max_value_size: REDIS_MAX_VALUE_SIZE,
            scan_count: 1000,
        }
    }
}

impl RedisConfig {
    /// Create new config with URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set pool size
    pub fn pool_size(mut self, size: u32) -> Self {
        self.pool_size = size;
        self
    }

    /// Set connection timeout
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Set maximum value size
    pub fn max_value_size(mut self, size: usize) -> Self {
        self.max_value_size = size;
        self
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
