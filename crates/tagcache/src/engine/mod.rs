//! Tagged cache engine
//!
//! [`CacheEngine`] keeps three things on the backend for every entry: the
//! value, its identifier in the forward set of each tag, and the reverse
//! record listing those tags. None of the writes spanning them is atomic,
//! so every multi-step operation orders its writes such that an
//! interruption leaves tombstones (index members without an entry) rather
//! than entries no index can reach. Tombstones are tolerated everywhere.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use tagcache_core::{
    BackendAdapter, CacheError, CacheMetrics, CacheOperation, CacheStats, CommandGroup,
    EvictionReason, Expiration, IdentifierNamespacer, KeySpace, NoopMetrics, Result, SharedClock,
    SystemClock,
};

use crate::config::EngineConfig;

mod index;
mod validate;

pub use index::{ReverseTagIndex, TagIndex};
use validate::Validator;

/// Maximum commands sent in one group while flushing
const FLUSH_BATCH_SIZE: usize = 1000;

/// Tagged cache engine over a [`BackendAdapter`]
///
/// Generic over:
/// - `B`: the backend adapter, `dyn BackendAdapter` when built from config
/// - `M`: the metrics collector
///
/// Cloning is cheap and shares the backend.
pub struct CacheEngine<B = dyn BackendAdapter, M = NoopMetrics>
where
    B: BackendAdapter + ?Sized,
    M: CacheMetrics,
{
    backend: Arc<B>,
    namespacer: Arc<IdentifierNamespacer>,
    forward: TagIndex<B>,
    reverse: ReverseTagIndex<B>,
    validator: Validator,
    metrics: Arc<M>,
    clock: SharedClock,
    config: EngineConfig,
}

impl<B: BackendAdapter> CacheEngine<B, NoopMetrics> {
    /// Create an engine owning `backend`
    pub fn new(backend: B, config: EngineConfig) -> Self {
        Self::from_shared(Arc::new(backend), config)
    }
}

impl<B: BackendAdapter + ?Sized> CacheEngine<B, NoopMetrics> {
    /// Create an engine over an already shared backend
    pub fn from_shared(backend: Arc<B>, config: EngineConfig) -> Self {
        Self::with_metrics(backend, NoopMetrics, config)
    }
}

impl<B, M> CacheEngine<B, M>
where
    B: BackendAdapter + ?Sized,
    M: CacheMetrics,
{
    /// Create an engine reporting to `metrics`
    pub fn with_metrics(backend: Arc<B>, metrics: M, config: EngineConfig) -> Self {
        let namespacer = Arc::new(IdentifierNamespacer::new(
            &config.application_identity,
            &config.cache_name,
        ));
        let validator = Validator::new(backend.limits(), &namespacer);

        debug!(
            target: "tagcache",
            backend = backend.name(),
            prefix = namespacer.prefix(),
            cache = %config.cache_name,
            "Cache engine created"
        );

        Self {
            forward: TagIndex::new(backend.clone(), namespacer.clone()),
            reverse: ReverseTagIndex::new(backend.clone(), namespacer.clone()),
            backend,
            namespacer,
            validator,
            metrics: Arc::new(metrics),
            clock: Arc::new(SystemClock),
            config,
        }
    }

    /// Replace the clock used to encode lifetimes and collect garbage
    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    /// Store `value` under `identifier` with exactly `tags`
    ///
    /// Replaces any previous value and tag assignment. `lifetime` is in
    /// seconds; `None` uses the configured default and `Some(0)` never
    /// expires.
    pub async fn set<I, T>(
        &self,
        identifier: &str,
        value: &[u8],
        tags: I,
        lifetime: Option<u64>,
    ) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let start = Instant::now();

        self.validator.identifier(identifier)?;
        self.validator.value(value)?;
        let tags: BTreeSet<String> = tags.into_iter().map(|t| t.as_ref().to_string()).collect();
        for tag in &tags {
            self.validator.tag(tag)?;
        }

        let lifetime = lifetime.unwrap_or(self.config.default_lifetime);
        let expiration = Expiration::from_lifetime(lifetime, self.clock.now());

        let result = self.write_entry(identifier, value, expiration, &tags).await;
        self.finish(CacheOperation::Set, start, &result);

        debug!(
            target: "tagcache",
            identifier,
            tags = tags.len(),
            ?expiration,
            ok = result.is_ok(),
            "set"
        );
        result
    }

    async fn write_entry(
        &self,
        identifier: &str,
        value: &[u8],
        expiration: Expiration,
        tags: &BTreeSet<String>,
    ) -> Result<()> {
        // 1. The value, so no index can point at an entry newer than itself
        let stored = self
            .backend
            .kv_set(&self.namespacer.entry_key(identifier), value, expiration)
            .await;

        // Without the previous record stale memberships cannot be found.
        // Leave the old indexes alone so a later set or remove still cleans them.
        let previous = match self.reverse.tags_of(identifier).await {
            Ok(previous) => previous,
            Err(e) => return Err(stored.err().unwrap_or(e)),
        };

        if previous.is_empty() && tags.is_empty() {
            return stored;
        }

        // 2. Forward index, then 3. the reverse record last
        let mut group = CommandGroup::new();
        for stale in previous.difference(tags) {
            self.forward.queue_remove(&mut group, stale, identifier);
        }
        for tag in tags {
            self.forward.queue_add(&mut group, tag, identifier);
        }
        self.reverse.queue_replace(&mut group, identifier, tags);

        let indexed = self.backend.execute_group(group).await;
        if let Err(e) = &indexed {
            warn!(target: "tagcache", identifier, error = %e, "Tag index update failed");
        }

        stored.and(indexed)
    }

    /// Get the live value of `identifier`
    ///
    /// An empty value is a hit, not absence.
    pub async fn get(&self, identifier: &str) -> Result<Option<Vec<u8>>> {
        let start = Instant::now();
        self.validator.identifier(identifier)?;

        let result = self
            .backend
            .kv_get(&self.namespacer.entry_key(identifier))
            .await;

        if let Ok(value) = &result {
            match value {
                Some(_) => self.metrics.record_hit(identifier),
                None => self.metrics.record_miss(identifier),
            }
        }
        self.finish(CacheOperation::Get, start, &result);
        result
    }

    /// Whether `identifier` holds a live value
    pub async fn has(&self, identifier: &str) -> Result<bool> {
        let start = Instant::now();
        self.validator.identifier(identifier)?;

        let result = self
            .backend
            .kv_exists(&self.namespacer.entry_key(identifier))
            .await;

        self.finish(CacheOperation::Has, start, &result);
        result
    }

    /// Remove `identifier` and its index memberships
    ///
    /// Returns `true` if a live entry existed.
    pub async fn remove(&self, identifier: &str) -> Result<bool> {
        let start = Instant::now();
        self.validator.identifier(identifier)?;

        let result = self.remove_entry(identifier).await;
        if let Ok(true) = result {
            self.metrics.record_eviction(EvictionReason::Removed, 1);
        }
        self.finish(CacheOperation::Remove, start, &result);

        debug!(target: "tagcache", identifier, removed = ?result.as_ref().ok(), "remove");
        result
    }

    async fn remove_entry(&self, identifier: &str) -> Result<bool> {
        let entry_key = self.namespacer.entry_key(identifier);

        // 1. Forward memberships, 2. the reverse record
        let unindexed = match self.reverse.tags_of(identifier).await {
            Ok(tags) if tags.is_empty() => Ok(()),
            Ok(tags) => {
                let mut group = CommandGroup::new();
                for tag in &tags {
                    self.forward.queue_remove(&mut group, tag, identifier);
                }
                self.reverse.queue_clear(&mut group, identifier);
                self.backend.execute_group(group).await
            }
            Err(e) => Err(e),
        };
        if let Err(e) = &unindexed {
            warn!(target: "tagcache", identifier, error = %e, "Tag index cleanup failed");
        }

        // 3. The value last, so an interruption leaves it reachable
        let deleted = self.backend.kv_delete(&entry_key).await;

        match unindexed {
            Ok(()) => deleted,
            Err(e) => Err(e),
        }
    }

    /// Remove every entry carrying `tag`
    ///
    /// Returns how many live entries were removed. Entries whose removal
    /// fails are logged and skipped; the rest are still processed.
    pub async fn flush_by_tag(&self, tag: &str) -> Result<u64> {
        let start = Instant::now();
        self.validator.tag(tag)?;

        let result = self.flush_tag(tag).await;
        if let Ok(removed) = result {
            self.metrics.record_eviction(EvictionReason::TagFlushed, removed);
        }
        self.finish(CacheOperation::FlushByTag, start, &result);
        result
    }

    async fn flush_tag(&self, tag: &str) -> Result<u64> {
        let members = self.forward.members(tag).await?;

        let mut removed = 0u64;
        let mut failed = 0usize;
        for identifier in &members {
            match self.remove_entry(identifier).await {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(e) => {
                    failed += 1;
                    warn!(target: "tagcache", tag, identifier = %identifier, error = %e, "Failed to remove tagged entry");
                }
            }
        }

        self.forward.clear(tag).await?;

        if failed > 0 {
            warn!(target: "tagcache", tag, removed, failed, "Tag flush partially failed");
        }
        info!(target: "tagcache", tag, members = members.len(), removed, "Flushed tag");
        Ok(removed)
    }

    /// Identifiers recorded under `tag`
    ///
    /// May include identifiers whose entries already expired or were
    /// removed. Callers needing certainty follow up with [`get`](Self::get).
    pub async fn find_identifiers_by_tag(&self, tag: &str) -> Result<BTreeSet<String>> {
        let start = Instant::now();
        self.validator.tag(tag)?;

        let result = self.forward.members(tag).await;
        self.finish(CacheOperation::FindByTag, start, &result);
        result
    }

    /// Remove everything in this cache's namespace
    ///
    /// Other namespaces on the same backend are untouched. Entries written
    /// concurrently may survive.
    pub async fn flush(&self) -> Result<()> {
        let start = Instant::now();

        let mut first_error: Option<CacheError> = None;
        let mut deleted = 0usize;
        for space in KeySpace::ALL {
            match self.flush_space(space).await {
                Ok(count) => deleted += count,
                Err(e) => {
                    warn!(target: "tagcache", space = space.as_str(), error = %e, "Failed to flush key space");
                    first_error.get_or_insert(e);
                }
            }
        }

        info!(target: "tagcache", prefix = self.namespacer.prefix(), keys = deleted, "Flushed cache");

        let result = match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        };
        self.finish(CacheOperation::Flush, start, &result);
        result
    }

    async fn flush_space(&self, space: KeySpace) -> Result<usize> {
        let prefix = self.namespacer.space_prefix(space);
        let keys = match space {
            KeySpace::Entry => self.backend.kv_keys(&prefix).await?,
            KeySpace::ForwardTag | KeySpace::ReverseTag => self.backend.set_keys(&prefix).await?,
        };

        let mut first_error = None;
        for batch in keys.chunks(FLUSH_BATCH_SIZE) {
            let mut group = CommandGroup::new();
            for key in batch {
                match space {
                    KeySpace::Entry => group.kv_delete(key.clone()),
                    KeySpace::ForwardTag | KeySpace::ReverseTag => group.set_clear(key.clone()),
                };
            }
            if let Err(e) = self.backend.execute_group(group).await {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(keys.len()),
        }
    }

    /// Purge expired entries and their index memberships
    ///
    /// A no-op returning 0 on backends with native expiration. Otherwise
    /// returns how many expired entries were collected.
    pub async fn collect_garbage(&self) -> Result<u64> {
        let start = Instant::now();

        let result = if self.backend.supports_native_expiration() {
            debug!(target: "tagcache", backend = self.backend.name(), "Backend expires natively, nothing to collect");
            Ok(0)
        } else {
            self.collect_expired().await
        };

        if let Ok(collected) = result {
            self.metrics.record_eviction(EvictionReason::Expired, collected);
        }
        self.finish(CacheOperation::CollectGarbage, start, &result);
        result
    }

    async fn collect_expired(&self) -> Result<u64> {
        let now = self.clock.now();
        let expired = self
            .backend
            .expired_keys(&self.namespacer.space_prefix(KeySpace::Entry), now)
            .await?;

        let mut collected = 0u64;
        let mut failed = 0usize;
        for key in &expired {
            let Some(identifier) = self.namespacer.identifier_from_entry_key(key) else {
                continue;
            };
            match self.collect_one(identifier).await {
                Ok(true) => collected += 1,
                Ok(false) => {}
                Err(e) => {
                    failed += 1;
                    warn!(target: "tagcache", identifier, error = %e, "Failed to collect expired entry");
                }
            }
        }

        info!(target: "tagcache", expired = expired.len(), collected, failed, "Garbage collection finished");
        Ok(collected)
    }

    async fn collect_one(&self, identifier: &str) -> Result<bool> {
        // Rewritten since it was listed
        if self
            .backend
            .kv_exists(&self.namespacer.entry_key(identifier))
            .await?
        {
            return Ok(false);
        }
        self.remove_entry(identifier).await?;
        Ok(true)
    }

    /// Physical key of `identifier`, for readers sharing the backend
    pub fn prefixed_identifier(&self, identifier: &str) -> String {
        self.namespacer.prefixed_identifier(identifier)
    }

    /// The namespacer of this cache
    pub fn namespacer(&self) -> &IdentifierNamespacer {
        &self.namespacer
    }

    /// The forward tag index
    pub fn tag_index(&self) -> &TagIndex<B> {
        &self.forward
    }

    /// The reverse tag index
    pub fn reverse_tag_index(&self) -> &ReverseTagIndex<B> {
        &self.reverse
    }

    /// The backend adapter
    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Backend statistics
    pub async fn stats(&self) -> Result<CacheStats> {
        self.backend.stats().await
    }

    fn finish<T>(&self, operation: CacheOperation, start: Instant, result: &Result<T>) {
        self.metrics.record_latency(operation, start.elapsed());
        if let Err(e) = result {
            self.metrics.record_error(operation, e.kind());
        }
    }
}

impl<B, M> Clone for CacheEngine<B, M>
where
    B: BackendAdapter + ?Sized,
    M: CacheMetrics,
{
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            namespacer: self.namespacer.clone(),
            forward: self.forward.clone(),
            reverse: self.reverse.clone(),
            validator: self.validator,
            metrics: self.metrics.clone(),
            clock: self.clock.clone(),
            config: self.config.clone(),
        }
    }
}
