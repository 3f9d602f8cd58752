//! Backend adapter trait

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::{BackendLimits, CacheError, CacheStats, CommandGroup, Expiration, GroupCommand};

/// Capability set of a physical store
///
/// Adapters see fully namespaced keys and opaque bytes only. Tag sets are
/// plain string sets; the engine decides what their keys and members mean.
///
/// None of these operations is atomic with respect to any other, and
/// [`execute_group`](Self::execute_group) only saves round trips.
#[async_trait]
pub trait BackendAdapter: Send + Sync + 'static {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Key and value size limits
    fn limits(&self) -> BackendLimits;

    /// Whether the store evicts expired values by itself
    ///
    /// Backends returning `false` must implement
    /// [`expired_keys`](Self::expired_keys).
    fn supports_native_expiration(&self) -> bool;

    /// Get a live value
    ///
    /// Returns `None` if the key doesn't exist or has expired.
    async fn kv_get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Store a value, replacing any previous one
    async fn kv_set(
        &self,
        key: &str,
        value: &[u8],
        expiration: Expiration,
    ) -> Result<(), CacheError>;

    /// Delete a value
    ///
    /// Returns `true` if a live value existed and was deleted.
    async fn kv_delete(&self, key: &str) -> Result<bool, CacheError>;

    /// Check for a live value, using the same expiry rule as `kv_get`
    async fn kv_exists(&self, key: &str) -> Result<bool, CacheError>;

    /// Add a member to a tag set
    async fn set_add_member(&self, set_key: &str, member: &str) -> Result<(), CacheError>;

    /// Remove a member from a tag set
    async fn set_remove_member(&self, set_key: &str, member: &str) -> Result<(), CacheError>;

    /// All members of a tag set, empty if the set doesn't exist
    async fn set_list_members(&self, set_key: &str) -> Result<BTreeSet<String>, CacheError>;

    /// Remove the whole tag set
    async fn set_clear(&self, set_key: &str) -> Result<(), CacheError>;

    /// All value keys starting with `prefix`
    async fn kv_keys(&self, prefix: &str) -> Result<Vec<String>, CacheError>;

    /// All tag set keys starting with `prefix`
    async fn set_keys(&self, prefix: &str) -> Result<Vec<String>, CacheError>;

    /// Value keys starting with `prefix` whose expiration is at or before `now`
    ///
    /// Only consulted when native expiration is not supported.
    async fn expired_keys(&self, _prefix: &str, _now: u64) -> Result<Vec<String>, CacheError> {
        Ok(Vec::new())
    }

    /// Run a batch of writes
    ///
    /// Every command is attempted even if an earlier one fails; the first
    /// failure is returned afterwards.
    async fn execute_group(&self, group: CommandGroup) -> Result<(), CacheError> {
        let mut first_error = None;
        for command in group {
            let result = match &command {
                GroupCommand::KvDelete(key) => self.kv_delete(key).await.map(|_| ()),
                GroupCommand::SetAdd { set, member } => self.set_add_member(set, member).await,
                GroupCommand::SetRemove { set, member } => {
                    self.set_remove_member(set, member).await
                }
                GroupCommand::SetClear(set) => self.set_clear(set).await,
            };
            if let Err(e) = result {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Get backend statistics
    async fn stats(&self) -> Result<CacheStats, CacheError> {
        Ok(CacheStats::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records set operations and fails every write to `broken`
    #[derive(Default)]
    struct RecordingBackend {
        log: Mutex<Vec<String>>,
    }

    impl RecordingBackend {
        fn record(&self, op: &str, key: &str) -> Result<(), CacheError> {
            self.log.lock().unwrap().push(format!("{op} {key}"));
            if key == "broken" {
                return Err(CacheError::Connection("broken pipe".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl BackendAdapter for RecordingBackend {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn limits(&self) -> BackendLimits {
            BackendLimits::default()
        }

        fn supports_native_expiration(&self) -> bool {
            true
        }

        async fn kv_get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
            Ok(None)
        }

        async fn kv_set(&self, key: &str, _: &[u8], _: Expiration) -> Result<(), CacheError> {
            self.record("set", key)
        }

        async fn kv_delete(&self, key: &str) -> Result<bool, CacheError> {
            self.record("del", key).map(|_| true)
        }

        async fn kv_exists(&self, _key: &str) -> Result<bool, CacheError> {
            Ok(false)
        }

        async fn set_add_member(&self, set_key: &str, _: &str) -> Result<(), CacheError> {
            self.record("sadd", set_key)
        }

        async fn set_remove_member(&self, set_key: &str, _: &str) -> Result<(), CacheError> {
            self.record("srem", set_key)
        }

        async fn set_list_members(&self, _: &str) -> Result<BTreeSet<String>, CacheError> {
            Ok(BTreeSet::new())
        }

        async fn set_clear(&self, set_key: &str) -> Result<(), CacheError> {
            self.record("sclear", set_key)
        }

        async fn kv_keys(&self, _: &str) -> Result<Vec<String>, CacheError> {
            Ok(Vec::new())
        }

        async fn set_keys(&self, _: &str) -> Result<Vec<String>, CacheError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_group_runs_every_command_after_failure() {
        let backend = RecordingBackend::default();
        let mut group = CommandGroup::new();
        group
            .set_remove("a", "id")
            .set_add("broken", "id")
            .set_clear("b")
            .kv_delete("c");

        let result = backend.execute_group(group).await;

        assert!(matches!(result, Err(CacheError::Connection(_))));
        assert_eq!(
            *backend.log.lock().unwrap(),
            vec!["srem a", "sadd broken", "sclear b", "del c"]
        );
    }

    #[tokio::test]
    async fn test_default_expired_keys_is_empty() {
        let backend = RecordingBackend::default();
        assert!(backend.expired_keys("p", u64::MAX).await.unwrap().is_empty());
        assert_eq!(backend.stats().await.unwrap(), CacheStats::default());
    }
}
