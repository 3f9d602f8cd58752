//! Argument checks run before any backend call

use tagcache_core::{BackendLimits, CacheError, IdentifierNamespacer, KeySpace, Result};

/// Length and size bounds derived from the backend limits
///
/// Identifiers and tags end up inside physical keys, so their budget is
/// the backend key limit minus the namespace overhead of their space.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Validator {
    max_identifier_length: usize,
    max_tag_length: usize,
    max_value_size: usize,
}

impl Validator {
    pub(crate) fn new(limits: BackendLimits, namespacer: &IdentifierNamespacer) -> Self {
        let identifier_overhead = namespacer
            .overhead(KeySpace::Entry)
            .max(namespacer.overhead(KeySpace::ReverseTag));

        Self {
            max_identifier_length: limits.max_key_length.saturating_sub(identifier_overhead),
            max_tag_length: limits
                .max_key_length
                .saturating_sub(namespacer.overhead(KeySpace::ForwardTag)),
            max_value_size: limits.max_value_size,
        }
    }

    pub(crate) fn identifier(&self, identifier: &str) -> Result<()> {
        check_name("identifier", identifier, self.max_identifier_length)
    }

    pub(crate) fn tag(&self, tag: &str) -> Result<()> {
        check_name("tag", tag, self.max_tag_length)
    }

    pub(crate) fn value(&self, value: &[u8]) -> Result<()> {
        if value.len() > self.max_value_size {
            return Err(CacheError::InvalidArgument(format!(
                "value is {} bytes, backend accepts at most {}",
                value.len(),
                self.max_value_size
            )));
        }
        Ok(())
    }
}

fn check_name(what: &str, name: &str, max_length: usize) -> Result<()> {
    if name.is_empty() {
        return Err(CacheError::InvalidArgument(format!("{what} must not be empty")));
    }
    if name.len() > max_length {
        return Err(CacheError::InvalidArgument(format!(
            "{what} is {} bytes, at most {max_length} allowed",
            name.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> Validator {
        let limits = BackendLimits {
            max_key_length: 50,
            max_value_size: 10,
        };
        Validator::new(limits, &IdentifierNamespacer::new("app", "cache"))
    }

    #[test]
    fn test_empty_names_rejected() {
        let v = validator();
        assert!(matches!(v.identifier(""), Err(CacheError::InvalidArgument(_))));
        assert!(matches!(v.tag(""), Err(CacheError::InvalidArgument(_))));
    }

    #[test]
    fn test_length_budget_subtracts_prefix() {
        let v = validator();
        // 16 byte prefix + 2 byte space marker
        assert!(v.identifier(&"a".repeat(32)).is_ok());
        assert!(v.identifier(&"a".repeat(33)).is_err());
        assert!(v.tag(&"t".repeat(32)).is_ok());
        assert!(v.tag(&"t".repeat(33)).is_err());
    }

    #[test]
    fn test_value_size() {
        let v = validator();
        assert!(v.value(b"").is_ok());
        assert!(v.value(&[0u8; 10]).is_ok());
        let err = v.value(&[0u8; 11]).unwrap_err();
        assert_eq!(err.to_string(), "invalid argument: value is 11 bytes, backend accepts at most 10");
    }

    #[test]
    fn test_tiny_key_limit_rejects_everything() {
        let limits = BackendLimits {
            max_key_length: 4,
            max_value_size: 10,
        };
        let v = Validator::new(limits, &IdentifierNamespacer::new("app", "cache"));
        assert!(v.identifier("a").is_err());
    }
}
