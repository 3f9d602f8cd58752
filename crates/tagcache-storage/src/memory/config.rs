use serde::Deserialize;
use tagcache_core::DEFAULT_MAX_KEY_LENGTH;

/// Largest value a single document may hold, (1024*1024)-42 bytes
pub const MAX_BUCKET_SIZE: usize = 1_048_534;

/// Configuration for the memory backend
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Maximum physical key length in bytes
    pub max_key_length: usize,
    /// Maximum value size in bytes
    pub max_value_size: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_key_length: DEFAULT_MAX_KEY_LENGTH,
            max_value_size: MAX_BUCKET_SIZE,
        }
    }
}

impl MemoryConfig {
    /// Set the maximum value size
    pub fn max_value_size(mut self, size: usize) -> Self {
        self.max_value_size = size;
        self
    }

    /// Set the maximum key length
    pub fn max_key_length(mut self, length: usize) -> Self {
        self.max_key_length = length;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json() {
        let config: MemoryConfig = serde_json::from_str(r#"{"max_value_size": 1024}"#).unwrap();
        assert_eq!(config.max_value_size, 1024);
        assert_eq!(config.max_key_length, DEFAULT_MAX_KEY_LENGTH);
    }

    #[test]
    fn test_empty_object_is_default() {
        let config: MemoryConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.max_value_size, MAX_BUCKET_SIZE);
    }
}
