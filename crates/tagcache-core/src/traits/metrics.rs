//! Metrics trait for cache observability

use std::time::Duration;

/// Cache operation for latency tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheOperation {
    Get,
    Has,
    Set,
    Remove,
    FindByTag,
    FlushByTag,
    Flush,
    CollectGarbage,
}

impl CacheOperation {
    /// Get operation as string label
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheOperation::Get => "get",
            CacheOperation::Has => "has",
            CacheOperation::Set => "set",
            CacheOperation::Remove => "remove",
            CacheOperation::FindByTag => "find_by_tag",
            CacheOperation::FlushByTag => "flush_by_tag",
            CacheOperation::Flush => "flush",
            CacheOperation::CollectGarbage => "collect_garbage",
        }
    }
}

/// Reason an entry left the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EvictionReason {
    /// Expired and collected
    Expired,
    /// Explicitly removed
    Removed,
    /// Removed through one of its tags
    TagFlushed,
}

impl EvictionReason {
    /// Get reason as string label
    pub fn as_str(&self) -> &'static str {
        match self {
            EvictionReason::Expired => "expired",
            EvictionReason::Removed => "removed",
            EvictionReason::TagFlushed => "tag_flushed",
        }
    }
}

/// Trait for cache metrics/observability
///
/// Implement this to integrate with your metrics system (Prometheus, StatsD, etc.)
pub trait CacheMetrics: Send + Sync + 'static {
    /// Record a cache hit
    fn record_hit(&self, identifier: &str);

    /// Record a cache miss
    fn record_miss(&self, identifier: &str);

    /// Record operation latency
    fn record_latency(&self, operation: CacheOperation, duration: Duration);

    /// Record entries leaving the cache
    fn record_eviction(&self, reason: EvictionReason, count: u64);

    /// Record an operation that failed
    fn record_error(&self, operation: CacheOperation, kind: &'static str);
}

/// No-op metrics implementation (default)
///
/// Zero overhead when metrics are not needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl CacheMetrics for NoopMetrics {
    #[inline]
    fn record_hit(&self, _identifier: &str) {}

    #[inline]
    fn record_miss(&self, _identifier: &str) {}

    #[inline]
    fn record_latency(&self, _operation: CacheOperation, _duration: Duration) {}

    #[inline]
    fn record_eviction(&self, _reason: EvictionReason, _count: u64) {}

    #[inline]
    fn record_error(&self, _operation: CacheOperation, _kind: &'static str) {}
}

/// Metrics adapter using the `metrics` crate
///
/// Integrates with Prometheus, StatsD, and other exporters via the `metrics` ecosystem.
///
/// # Example
/// ```ignore
/// use tagcache_core::MetricsCrateAdapter;
///
/// let metrics = MetricsCrateAdapter::new("tagcache");
/// // Emits: tagcache_hits_total, tagcache_evictions_total, etc.
/// ```
#[cfg(feature = "metrics")]
#[derive(Debug, Clone)]
pub struct MetricsCrateAdapter {
    prefix: String,
}

#[cfg(feature = "metrics")]
impl MetricsCrateAdapter {
    /// Create a new adapter with the given metric name prefix
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn metric_name(&self, name: &str) -> String {
        format!("{}_{}", self.prefix, name)
    }
}

#[cfg(feature = "metrics")]
impl CacheMetrics for MetricsCrateAdapter {
    fn record_hit(&self, _identifier: &str) {
        metrics::counter!(self.metric_name("hits_total")).increment(1);
    }

    fn record_miss(&self, _identifier: &str) {
        metrics::counter!(self.metric_name("misses_total")).increment(1);
    }

    fn record_latency(&self, operation: CacheOperation, duration: Duration) {
        metrics::histogram!(
            self.metric_name("operation_duration_seconds"),
            "operation" => operation.as_str()
        )
        .record(duration.as_secs_f64());
    }

    fn record_eviction(&self, reason: EvictionReason, count: u64) {
        metrics::counter!(
            self.metric_name("evictions_total"),
            "reason" => reason.as_str()
        )
        .increment(count);
    }

    fn record_error(&self, operation: CacheOperation, kind: &'static str) {
        metrics::counter!(
            self.metric_name("errors_total"),
            "operation" => operation.as_str(),
            "kind" => kind
        )
        .increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_as_str() {
        assert_eq!(CacheOperation::Get.as_str(), "get");
        assert_eq!(CacheOperation::FlushByTag.as_str(), "flush_by_tag");
        assert_eq!(CacheOperation::CollectGarbage.as_str(), "collect_garbage");
    }

    #[test]
    fn test_eviction_reason_as_str() {
        assert_eq!(EvictionReason::Expired.as_str(), "expired");
        assert_eq!(EvictionReason::TagFlushed.as_str(), "tag_flushed");
    }

    #[test]
    fn test_noop_metrics() {
        let metrics = NoopMetrics;
        // Just verify these don't panic
        metrics.record_hit("key");
        metrics.record_miss("key");
        metrics.record_latency(CacheOperation::Get, Duration::from_millis(1));
        metrics.record_eviction(EvictionReason::Removed, 3);
        metrics.record_error(CacheOperation::Set, "connection");
    }
}
