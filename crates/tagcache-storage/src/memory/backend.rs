//! In-memory document store backend using DashMap

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::BTreeSet;
use std::sync::Arc;

use tagcache_core::{
    BackendAdapter, BackendLimits, CacheStats, Expiration, Result, SharedClock, SystemClock,
};

use super::config::MemoryConfig;
use super::expiry_index::ExpiryIndex;

/// One stored entry
#[derive(Debug, Clone)]
struct Document {
    value: Vec<u8>,
    /// Expiration exactly as the caller encoded it
    expiration: Expiration,
    /// Absolute deadline resolved at write time
    deadline: Option<u64>,
}

impl Document {
    fn is_live(&self, now: u64) -> bool {
        self.deadline.is_none_or(|deadline| now < deadline)
    }
}

/// Internal statistics tracking
#[derive(Debug, Default)]
struct MemoryStats {
    hits: u64,
    misses: u64,
    writes: u64,
    deletes: u64,
    evictions: u64,
}

/// In-memory document store backend
///
/// Values live in `DashMap` documents, tag sets in a second map. Expired
/// documents are hidden from reads but kept until deleted, so the engine's
/// garbage collection can still repair the tag indexes for them.
/// Cloning creates a new handle to the SAME underlying store.
#[derive(Clone)]
pub struct MemoryBackend {
    /// Value documents
    documents: Arc<DashMap<String, Document>>,
    /// Tag sets
    sets: Arc<DashMap<String, BTreeSet<String>>>,
    /// Deadline index for expired document lookups
    expiry: Arc<RwLock<ExpiryIndex>>,
    /// Statistics
    stats: Arc<RwLock<MemoryStats>>,
    clock: SharedClock,
    /// Configuration
    config: MemoryConfig,
}

impl MemoryBackend {
    /// Create a new memory backend on the system clock
    pub fn new(config: MemoryConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a backend reading time from `clock`
    pub fn with_clock(config: MemoryConfig, clock: SharedClock) -> Self {
        Self {
            documents: Arc::new(DashMap::new()),
            sets: Arc::new(DashMap::new()),
            expiry: Arc::new(RwLock::new(ExpiryIndex::new())),
            stats: Arc::new(RwLock::new(MemoryStats::default())),
            clock,
            config,
        }
    }

    /// Create with default configuration
    pub fn with_defaults() -> Self {
        Self::new(MemoryConfig::default())
    }

    /// Expiration stored for `key`, whether or not it has passed
    pub fn stored_expiration(&self, key: &str) -> Option<Expiration> {
        self.documents.get(key).map(|doc| doc.expiration)
    }

    /// Number of stored documents, expired ones included
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Number of non-empty tag sets
    pub fn set_count(&self) -> usize {
        self.sets.len()
    }

    /// Get approximate memory usage
    pub fn memory_usage(&self) -> usize {
        self.documents
            .iter()
            .map(|doc| doc.value.len() + doc.key().len())
            .sum()
    }

    fn live_value(&self, key: &str) -> Option<Vec<u8>> {
        let now = self.clock.now();
        self.documents
            .get(key)
            .filter(|doc| doc.is_live(now))
            .map(|doc| doc.value.clone())
    }
}

#[async_trait]
impl BackendAdapter for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn limits(&self) -> BackendLimits {
        BackendLimits {
            max_key_length: self.config.max_key_length,
            max_value_size: self.config.max_value_size,
        }
    }

    fn supports_native_expiration(&self) -> bool {
        false
    }

    async fn kv_get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let value = self.live_value(key);

        let mut stats = self.stats.write();
        if value.is_some() {
            stats.hits += 1;
        } else {
            stats.misses += 1;
        }
        Ok(value)
    }

    async fn kv_set(&self, key: &str, value: &[u8], expiration: Expiration) -> Result<()> {
        let deadline = expiration.deadline(self.clock.now());

        // Document and deadline change under one expiry lock, or a racing
        // delete could leave a live deadline the collector never sees
        {
            let mut expiry = self.expiry.write();
            match deadline {
                Some(deadline) => expiry.schedule(key.to_string(), deadline),
                None => expiry.remove(key),
            }
            self.documents.insert(
                key.to_string(),
                Document {
                    value: value.to_vec(),
                    expiration,
                    deadline,
                },
            );
        }
        self.stats.write().writes += 1;

        Ok(())
    }

    async fn kv_delete(&self, key: &str) -> Result<bool> {
        let now = self.clock.now();
        let removed = {
            let mut expiry = self.expiry.write();
            expiry.remove(key);
            self.documents.remove(key)
        };

        match removed {
            Some((_, doc)) if doc.is_live(now) => {
                self.stats.write().deletes += 1;
                Ok(true)
            }
            Some(_) => {
                self.stats.write().evictions += 1;
                Ok(false)
            }
            None => Ok(false),
        }
    }

    async fn kv_exists(&self, key: &str) -> Result<bool> {
        let now = self.clock.now();
        Ok(self
            .documents
            .get(key)
            .is_some_and(|doc| doc.is_live(now)))
    }

    async fn set_add_member(&self, set_key: &str, member: &str) -> Result<()> {
        self.sets
            .entry(set_key.to_string())
            .or_default()
            .insert(member.to_string());
        Ok(())
    }

    async fn set_remove_member(&self, set_key: &str, member: &str) -> Result<()> {
        if let Some(mut members) = self.sets.get_mut(set_key) {
            members.remove(member);
        }
        // Empty sets disappear, as they do in Redis
        self.sets.remove_if(set_key, |_, members| members.is_empty());
        Ok(())
    }

    async fn set_list_members(&self, set_key: &str) -> Result<BTreeSet<String>> {
        Ok(self
            .sets
            .get(set_key)
            .map(|members| members.clone())
            .unwrap_or_default())
    }

    async fn set_clear(&self, set_key: &str) -> Result<()> {
        self.sets.remove(set_key);
        Ok(())
    }

    async fn kv_keys(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .documents
            .iter()
            .filter(|doc| doc.key().starts_with(prefix))
            .map(|doc| doc.key().clone())
            .collect())
    }

    async fn set_keys(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .sets
            .iter()
            .filter(|set| set.key().starts_with(prefix))
            .map(|set| set.key().clone())
            .collect())
    }

    async fn expired_keys(&self, prefix: &str, now: u64) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self
            .expiry
            .read()
            .expired(now)
            .into_iter()
            .filter(|key| key.starts_with(prefix))
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn stats(&self) -> Result<CacheStats> {
        let stats = self.stats.read();
        Ok(CacheStats {
            hits: stats.hits,
            misses: stats.misses,
            writes: stats.writes,
            deletes: stats.deletes,
            evictions: stats.evictions,
            size: self.documents.len(),
            memory_bytes: self.memory_usage(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use tagcache_core::{Clock, ManualClock};

    const NOW: u64 = 1_700_000_000;

    fn backend_at(now: u64) -> (MemoryBackend, ManualClock) {
        let clock = ManualClock::new(now);
        let backend = MemoryBackend::with_clock(MemoryConfig::default(), Arc::new(clock.clone()));
        (backend, clock)
    }

    #[tokio::test]
    async fn test_basic_get_set() {
        let backend = MemoryBackend::with_defaults();

        backend
            .kv_set("key1", b"value1", Expiration::Relative(60))
            .await
            .unwrap();

        let result = backend.kv_get("key1").await.unwrap();
        assert_eq!(result, Some(b"value1".to_vec()));
    }

    #[tokio::test]
    async fn test_empty_value_is_not_absence() {
        let backend = MemoryBackend::with_defaults();
        backend
            .kv_set("empty", b"", Expiration::Unlimited)
            .await
            .unwrap();

        assert_eq!(backend.kv_get("empty").await.unwrap(), Some(Vec::new()));
        assert!(backend.kv_exists("empty").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete() {
        let backend = MemoryBackend::with_defaults();

        backend
            .kv_set("key1", b"value1", Expiration::Unlimited)
            .await
            .unwrap();
        assert!(backend.kv_exists("key1").await.unwrap());

        assert!(backend.kv_delete("key1").await.unwrap());
        assert!(!backend.kv_exists("key1").await.unwrap());
        assert!(!backend.kv_delete("key1").await.unwrap());
    }

    #[tokio::test]
    async fn test_get_nonexistent() {
        let backend = MemoryBackend::with_defaults();
        assert!(backend.kv_get("nonexistent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_relative_expiration() {
        let (backend, clock) = backend_at(NOW);
        backend
            .kv_set("k", b"v", Expiration::Relative(100))
            .await
            .unwrap();

        clock.advance(99);
        assert!(backend.kv_exists("k").await.unwrap());

        clock.advance(1);
        assert!(!backend.kv_exists("k").await.unwrap());
        assert!(backend.kv_get("k").await.unwrap().is_none());
        // Still physically there until deleted
        assert_eq!(backend.document_count(), 1);
        assert_eq!(backend.stored_expiration("k"), Some(Expiration::Relative(100)));
    }

    #[tokio::test]
    async fn test_absolute_expiration() {
        let (backend, clock) = backend_at(NOW);
        backend
            .kv_set("k", b"v", Expiration::Absolute(NOW + 3_000_000))
            .await
            .unwrap();

        clock.set(NOW + 2_999_999);
        assert!(backend.kv_exists("k").await.unwrap());

        clock.set(NOW + 3_000_000);
        assert!(!backend.kv_exists("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_of_expired_reports_absent() {
        let (backend, clock) = backend_at(NOW);
        backend
            .kv_set("k", b"v", Expiration::Relative(10))
            .await
            .unwrap();
        clock.advance(10);

        assert!(!backend.kv_delete("k").await.unwrap());
        assert_eq!(backend.document_count(), 0);
        assert_eq!(backend.stats().await.unwrap().evictions, 1);
    }

    #[tokio::test]
    async fn test_expired_keys_by_prefix() {
        let (backend, clock) = backend_at(NOW);
        backend.kv_set("a:1", b"v", Expiration::Relative(10)).await.unwrap();
        backend.kv_set("a:2", b"v", Expiration::Unlimited).await.unwrap();
        backend.kv_set("b:1", b"v", Expiration::Relative(10)).await.unwrap();

        assert!(backend.expired_keys("a:", clock.now()).await.unwrap().is_empty());

        clock.advance(10);
        assert_eq!(
            backend.expired_keys("a:", clock.now()).await.unwrap(),
            vec!["a:1".to_string()]
        );
    }

    #[tokio::test]
    async fn test_overwrite_drops_old_deadline() {
        let (backend, clock) = backend_at(NOW);
        backend.kv_set("k", b"v1", Expiration::Relative(10)).await.unwrap();
        backend.kv_set("k", b"v2", Expiration::Unlimited).await.unwrap();

        clock.advance(1000);
        assert!(backend.expired_keys("", clock.now()).await.unwrap().is_empty());
        assert_eq!(backend.kv_get("k").await.unwrap(), Some(b"v2".to_vec()));
    }

    #[test]
    fn test_set_delete_race_keeps_deadlines_indexed() {
        let backend = MemoryBackend::with_defaults();

        for round in 0..2_000 {
            let key = format!("k{round}");
            let barrier = Arc::new(Barrier::new(2));

            let setter = {
                let (backend, barrier, key) = (backend.clone(), barrier.clone(), key.clone());
                std::thread::spawn(move || {
                    barrier.wait();
                    tokio_test::block_on(backend.kv_set(&key, b"v", Expiration::Relative(10)))
                        .unwrap();
                })
            };
            let deleter = {
                let (backend, barrier, key) = (backend.clone(), barrier.clone(), key.clone());
                std::thread::spawn(move || {
                    barrier.wait();
                    tokio_test::block_on(backend.kv_delete(&key)).unwrap();
                })
            };
            setter.join().unwrap();
            deleter.join().unwrap();

            let stored = backend.stored_expiration(&key).is_some();
            assert_eq!(stored, backend.expiry.read().contains(&key), "round {round}");
        }
    }

    #[tokio::test]
    async fn test_sets() {
        let backend = MemoryBackend::with_defaults();

        backend.set_add_member("tag:a", "id1").await.unwrap();
        backend.set_add_member("tag:a", "id2").await.unwrap();
        backend.set_add_member("tag:a", "id1").await.unwrap();

        let members = backend.set_list_members("tag:a").await.unwrap();
        assert_eq!(members.len(), 2);

        backend.set_remove_member("tag:a", "id1").await.unwrap();
        backend.set_remove_member("tag:a", "id2").await.unwrap();
        assert!(backend.set_list_members("tag:a").await.unwrap().is_empty());
        assert_eq!(backend.set_count(), 0);

        backend.set_add_member("tag:b", "id3").await.unwrap();
        backend.set_clear("tag:b").await.unwrap();
        assert!(backend.set_list_members("tag:b").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_key_enumeration() {
        let backend = MemoryBackend::with_defaults();
        backend.kv_set("p:e:1", b"v", Expiration::Unlimited).await.unwrap();
        backend.kv_set("q:e:1", b"v", Expiration::Unlimited).await.unwrap();
        backend.set_add_member("p:t:x", "1").await.unwrap();

        assert_eq!(backend.kv_keys("p:").await.unwrap(), vec!["p:e:1".to_string()]);
        assert_eq!(backend.set_keys("p:").await.unwrap(), vec!["p:t:x".to_string()]);
        assert!(backend.set_keys("q:").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clone_shares_store() {
        let backend = MemoryBackend::with_defaults();
        let other = backend.clone();

        backend.kv_set("k", b"v", Expiration::Unlimited).await.unwrap();
        assert!(other.kv_exists("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_stats() {
        let backend = MemoryBackend::with_defaults();

        backend.kv_set("key1", b"value1", Expiration::Unlimited).await.unwrap();
        backend.kv_get("key1").await.unwrap();
        backend.kv_get("nonexistent").await.unwrap();

        let stats = backend.stats().await.unwrap();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.writes, 1);
        assert_eq!(stats.size, 1);
        assert_eq!(stats.memory_bytes, "key1".len() + "value1".len());
    }

    #[test]
    fn test_limits_follow_config() {
        let limits = MemoryBackend::new(MemoryConfig::default().max_value_size(1024)).limits();
        assert_eq!(limits.max_value_size, 1024);
        assert_eq!(limits.max_key_length, 250);
    }
}
