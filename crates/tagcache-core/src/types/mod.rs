//! Core types for cache operations

mod expiration;
mod group;
mod limits;
mod stats;

pub use expiration::{Expiration, RELATIVE_LIFETIME_LIMIT};
pub use group::{CommandGroup, GroupCommand};
pub use limits::{BackendLimits, DEFAULT_MAX_KEY_LENGTH};
pub use stats::CacheStats;
