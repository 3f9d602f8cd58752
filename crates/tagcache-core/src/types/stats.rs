//! Backend statistics

/// Statistics for backend operations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of value lookups that found a live entry
    pub hits: u64,
    /// Number of value lookups that found nothing
    pub misses: u64,
    /// Number of value writes
    pub writes: u64,
    /// Number of values deleted
    pub deletes: u64,
    /// Number of values evicted by expiration
    pub evictions: u64,
    /// Current number of stored values, when the backend can tell cheaply
    pub size: usize,
    /// Approximate bytes held by stored values
    pub memory_bytes: usize,
}

impl CacheStats {
    /// Calculate hit ratio (0.0 to 1.0)
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Calculate miss ratio (0.0 to 1.0)
    pub fn miss_ratio(&self) -> f64 {
        1.0 - self.hit_ratio()
    }

    /// Total lookups (hits + misses)
    pub fn total_requests(&self) -> u64 {
        self.hits + self.misses
    }
}
