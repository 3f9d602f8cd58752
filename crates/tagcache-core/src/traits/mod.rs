//! Core traits for cache operations

mod backend;
mod metrics;

#[cfg(feature = "tracing")]
mod tracing_metrics;

pub use backend::BackendAdapter;
pub use metrics::{CacheMetrics, CacheOperation, EvictionReason, NoopMetrics};

#[cfg(feature = "metrics")]
pub use metrics::MetricsCrateAdapter;

#[cfg(feature = "tracing")]
pub use tracing_metrics::TracingMetrics;
