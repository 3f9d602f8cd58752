//! Physical limits a backend imposes on keys and values

/// Key length limit of memcache-style stores, kept as the common default
pub const DEFAULT_MAX_KEY_LENGTH: usize = 250;

/// Size limits of a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendLimits {
    /// Maximum length of a physical key in bytes
    pub max_key_length: usize,
    /// Maximum size of a stored value in bytes
    pub max_value_size: usize,
}

impl Default for BackendLimits {
    fn default() -> Self {
        Self {
            max_key_length: DEFAULT_MAX_KEY_LENGTH,
            max_value_size: usize::MAX,
        }
    }
}
