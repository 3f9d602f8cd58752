//! Redis backend implementation

#[cfg(feature = "redis")]
mod backend;
mod config;

#[cfg(feature = "redis")]
pub use backend::RedisBackend;
pub use config::{REDIS_MAX_VALUE_SIZE, RedisConfig};
