//! Cache configuration and backend selection
//!
//! ```json
//! {
//!   "application_identity": "/srv/app",
//!   "cache_name": "routing",
//!   "default_lifetime": 3600,
//!   "backend": { "type": "redis", "url": "redis://127.0.0.1:6379" }
//! }
//! ```

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use tagcache_core::{BackendAdapter, CacheError, Result};
use tagcache_storage::{MemoryConfig, RedisConfig};

use crate::engine::CacheEngine;

/// Lifetime applied when `set` gets none, in seconds
pub const DEFAULT_LIFETIME: u64 = 3600;

/// Engine settings independent of the backend
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Identity of the application, usually its root path
    pub application_identity: String,
    /// Name of this cache inside the application
    pub cache_name: String,
    /// Default lifetime in seconds, 0 for unlimited
    #[serde(default = "default_lifetime")]
    pub default_lifetime: u64,
}

fn default_lifetime() -> u64 {
    DEFAULT_LIFETIME
}

impl EngineConfig {
    /// Create config for `cache_name` inside `application_identity`
    pub fn new(application_identity: impl Into<String>, cache_name: impl Into<String>) -> Self {
        Self {
            application_identity: application_identity.into(),
            cache_name: cache_name.into(),
            default_lifetime: DEFAULT_LIFETIME,
        }
    }

    /// Set the default lifetime in seconds
    pub fn default_lifetime(mut self, seconds: u64) -> Self {
        self.default_lifetime = seconds;
        self
    }
}

/// Backend selection, tagged by `type`
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendConfig {
    Memory(MemoryConfig),
    Redis(RedisConfig),
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Memory(MemoryConfig::default())
    }
}

/// Complete configuration of one cache
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(flatten)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub backend: BackendConfig,
}

impl CacheConfig {
    /// Parse a JSON configuration document
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| CacheError::Configuration(e.to_string()))
    }
}

/// Build the configured backend and an engine over it
///
/// Fails with [`CacheError::Configuration`] if the backend was not
/// compiled in or its client cannot be created.
pub async fn open(config: CacheConfig) -> Result<CacheEngine> {
    let backend = match config.backend {
        BackendConfig::Memory(options) => memory_backend(options)?,
        BackendConfig::Redis(options) => redis_backend(options).await?,
    };

    info!(
        target: "tagcache",
        backend = backend.name(),
        cache = %config.engine.cache_name,
        "Opened cache"
    );
    Ok(CacheEngine::from_shared(backend, config.engine))
}

#[cfg(feature = "memory")]
fn memory_backend(options: MemoryConfig) -> Result<Arc<dyn BackendAdapter>> {
    Ok(Arc::new(tagcache_storage::MemoryBackend::new(options)))
}

#[cfg(not(feature = "memory"))]
fn memory_backend(_options: MemoryConfig) -> Result<Arc<dyn BackendAdapter>> {
    Err(not_compiled_in("memory"))
}

#[cfg(feature = "redis")]
async fn redis_backend(options: RedisConfig) -> Result<Arc<dyn BackendAdapter>> {
    let backend = tagcache_storage::RedisBackend::new(options)
        .await
        .map_err(|e| CacheError::Configuration(e.to_string()))?;
    Ok(Arc::new(backend))
}

#[cfg(not(feature = "redis"))]
async fn redis_backend(_options: RedisConfig) -> Result<Arc<dyn BackendAdapter>> {
    Err(not_compiled_in("redis"))
}

#[cfg(not(all(feature = "memory", feature = "redis")))]
fn not_compiled_in(backend: &str) -> CacheError {
    CacheError::Configuration(format!(
        "{backend} backend is not available, enable the `{backend}` feature"
    ))
}
