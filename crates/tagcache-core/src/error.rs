//! Error types for cache operations

use thiserror::Error;

/// Main error type for all cache operations
///
/// Absence of an entry is never an error; lookups return `Option`.
#[derive(Error, Debug, Clone)]
pub enum CacheError {
    /// Required backend is unavailable or could not be constructed
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Backend unreachable or transport-level failure
    #[error("connection error: {0}")]
    Connection(String),

    /// Backend rejected a command
    #[error("backend error: {0}")]
    Backend(String),

    /// Malformed identifier, tag or value, detected before any backend call
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl CacheError {
    /// Short label of the error kind, used in log fields
    pub fn kind(&self) -> &'static str {
        match self {
            CacheError::Configuration(_) => "configuration",
            CacheError::Connection(_) => "connection",
            CacheError::Backend(_) => "backend",
            CacheError::InvalidArgument(_) => "invalid_argument",
        }
    }

    /// Whether the failure happened on the way to the store
    pub fn is_connection(&self) -> bool {
        matches!(self, CacheError::Connection(_))
    }
}

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CacheError::InvalidArgument("empty identifier".to_string());
        assert_eq!(err.to_string(), "invalid argument: empty identifier");

        let err = CacheError::Configuration("redis support not compiled in".to_string());
        assert_eq!(
            err.to_string(),
            "configuration error: redis support not compiled in"
        );

        let err = CacheError::Connection("refused".to_string());
        assert_eq!(err.to_string(), "connection error: refused");
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(CacheError::Backend("x".into()).kind(), "backend");
        assert!(CacheError::Connection("x".into()).is_connection());
        assert!(!CacheError::InvalidArgument("x".into()).is_connection());
    }

    #[test]
    fn test_error_clone() {
        let err = CacheError::Connection("timeout".to_string());
        let cloned = err.clone();
        assert_eq!(err.to_string(), cloned.to_string());
    }
}
