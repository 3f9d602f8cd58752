//! tagcache-core: Core traits and types for the tagcache storage engine
//!
//! This crate provides the backend capability trait, the key namespacing
//! scheme and the shared types used by the storage adapters and the engine.

mod clock;
mod error;
mod namespace;
mod traits;
mod types;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use error::{CacheError, Result};
pub use namespace::{IdentifierNamespacer, KeySpace};
pub use traits::*;
pub use types::*;
