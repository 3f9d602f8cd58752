//! tagcache: Tagged cache storage engine
//!
//! # Features
//!
//! - **Tag indexes**: every entry carries a set of tags; all entries of a
//!   tag can be listed or flushed at once
//! - **Pluggable backends**: in-process document store (`memory`) or Redis
//!   (`redis`), selected by configuration
//! - **Namespacing**: each cache only ever sees its own keys, even on a
//!   shared backend
//! - **Metrics integration** through [`CacheMetrics`]
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use tagcache::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//!     let backend = MemoryBackend::new(MemoryConfig::default());
//!     let cache = CacheEngine::new(backend, EngineConfig::new("/srv/app", "pages"));
//!
//!     cache.set("home", b"<html>", ["page", "user_42"], Some(60)).await?;
//!
//!     if let Some(value) = cache.get("home").await? {
//!         println!("Got {} bytes", value.len());
//!     }
//!
//!     let removed = cache.flush_by_tag("user_42").await?;
//!     println!("Removed {removed} entries");
//!
//!     Ok(())
//! }
//! ```

mod config;
mod engine;

// Re-export core
pub use tagcache_core::*;

// Re-export storage
pub use tagcache_storage::{MemoryConfig, RedisConfig};
#[cfg(feature = "memory")]
pub use tagcache_storage::MemoryBackend;
#[cfg(feature = "redis")]
pub use tagcache_storage::RedisBackend;

pub use config::{BackendConfig, CacheConfig, DEFAULT_LIFETIME, EngineConfig, open};
pub use engine::{CacheEngine, ReverseTagIndex, TagIndex};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        BackendAdapter, CacheConfig, CacheEngine, CacheError, EngineConfig, MemoryConfig,
        RedisConfig, Result, open,
    };

    #[cfg(feature = "memory")]
    pub use crate::MemoryBackend;

    #[cfg(feature = "redis")]
    pub use crate::RedisBackend;
}
