//! tagcache-storage: Backend adapters for tagcache
//!
//! - [`MemoryBackend`] (feature `memory`): in-process document store. Each
//!   entry is one document holding value and expiration; there is no
//!   native expiry, so expired documents stay until the engine collects
//!   them.
//! - `RedisBackend` (feature `redis`): key/value store with sets and
//!   native per-key expiration.
//!
//! The configuration types are always available so a configuration file
//! naming a backend can be parsed even when that backend is compiled out.

pub mod memory;
pub mod redis;

pub use memory::{MAX_BUCKET_SIZE, MemoryConfig};
#[cfg(feature = "memory")]
pub use memory::MemoryBackend;

pub use crate::redis::{REDIS_MAX_VALUE_SIZE, RedisConfig};
#[cfg(feature = "redis")]
pub use crate::redis::RedisBackend;
