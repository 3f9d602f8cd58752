//! In-memory document store backend

#[cfg(feature = "memory")]
mod backend;
mod config;
#[cfg(feature = "memory")]
mod expiry_index;

#[cfg(feature = "memory")]
pub use backend::MemoryBackend;
pub use config::{MAX_BUCKET_SIZE, MemoryConfig};
