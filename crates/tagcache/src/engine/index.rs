//! Forward and reverse tag indexes
//!
//! Both indexes are plain tag sets on the backend. Reads go straight to
//! the backend; writes are queued onto a [`CommandGroup`] so the engine
//! decides how they are ordered against the entry value.

use std::collections::BTreeSet;
use std::sync::Arc;

use tagcache_core::{BackendAdapter, CommandGroup, IdentifierNamespacer, Result};

/// Forward index: tag -> identifiers carrying it
pub struct TagIndex<B: ?Sized> {
    backend: Arc<B>,
    namespacer: Arc<IdentifierNamespacer>,
}

impl<B> TagIndex<B>
where
    B: BackendAdapter + ?Sized,
{
    pub(crate) fn new(backend: Arc<B>, namespacer: Arc<IdentifierNamespacer>) -> Self {
        Self {
            backend,
            namespacer,
        }
    }

    /// Identifiers currently recorded under `tag`
    ///
    /// May contain tombstones: identifiers whose entry is already gone.
    pub async fn members(&self, tag: &str) -> Result<BTreeSet<String>> {
        self.backend
            .set_list_members(&self.namespacer.forward_key(tag))
            .await
    }

    /// Drop the whole membership record of `tag`
    pub async fn clear(&self, tag: &str) -> Result<()> {
        self.backend
            .set_clear(&self.namespacer.forward_key(tag))
            .await
    }

    /// Queue adding `identifier` under `tag`
    pub fn queue_add(&self, group: &mut CommandGroup, tag: &str, identifier: &str) {
        group.set_add(self.namespacer.forward_key(tag), identifier);
    }

    /// Queue removing `identifier` from `tag`
    pub fn queue_remove(&self, group: &mut CommandGroup, tag: &str, identifier: &str) {
        group.set_remove(self.namespacer.forward_key(tag), identifier);
    }
}

impl<B: ?Sized> Clone for TagIndex<B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            namespacer: self.namespacer.clone(),
        }
    }
}

/// Reverse index: identifier -> tags assigned by its last `set`
pub struct ReverseTagIndex<B: ?Sized> {
    backend: Arc<B>,
    namespacer: Arc<IdentifierNamespacer>,
}

impl<B> ReverseTagIndex<B>
where
    B: BackendAdapter + ?Sized,
{
    pub(crate) fn new(backend: Arc<B>, namespacer: Arc<IdentifierNamespacer>) -> Self {
        Self {
            backend,
            namespacer,
        }
    }

    /// Tags recorded for `identifier`, empty if there is no record
    pub async fn tags_of(&self, identifier: &str) -> Result<BTreeSet<String>> {
        self.backend
            .set_list_members(&self.namespacer.reverse_key(identifier))
            .await
    }

    /// Queue overwriting the record of `identifier` with exactly `tags`
    pub fn queue_replace(&self, group: &mut CommandGroup, identifier: &str, tags: &BTreeSet<String>) {
        let key = self.namespacer.reverse_key(identifier);
        group.set_clear(key.clone());
        for tag in tags {
            group.set_add(key.clone(), tag.clone());
        }
    }

    /// Queue dropping the record of `identifier`
    pub fn queue_clear(&self, group: &mut CommandGroup, identifier: &str) {
        group.set_clear(self.namespacer.reverse_key(identifier));
    }
}

impl<B: ?Sized> Clone for ReverseTagIndex<B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            namespacer: self.namespacer.clone(),
        }
    }
}

#[cfg(all(test, feature = "memory"))]
mod tests {
    use super::*;
    use tagcache_core::GroupCommand;
    use tagcache_storage::MemoryBackend;

    fn indexes() -> (TagIndex<MemoryBackend>, ReverseTagIndex<MemoryBackend>, Arc<MemoryBackend>) {
        let backend = Arc::new(MemoryBackend::with_defaults());
        let namespacer = Arc::new(IdentifierNamespacer::new("app", "index"));
        (
            TagIndex::new(backend.clone(), namespacer.clone()),
            ReverseTagIndex::new(backend.clone(), namespacer),
            backend,
        )
    }

    #[tokio::test]
    async fn test_forward_add_remove() {
        let (forward, _, backend) = indexes();

        let mut group = CommandGroup::new();
        forward.queue_add(&mut group, "red", "a");
        forward.queue_add(&mut group, "red", "b");
        backend.execute_group(group).await.unwrap();

        let members = forward.members("red").await.unwrap();
        assert_eq!(members, BTreeSet::from(["a".to_string(), "b".to_string()]));

        let mut group = CommandGroup::new();
        forward.queue_remove(&mut group, "red", "a");
        backend.execute_group(group).await.unwrap();
        assert_eq!(
            forward.members("red").await.unwrap(),
            BTreeSet::from(["b".to_string()])
        );

        forward.clear("red").await.unwrap();
        assert!(forward.members("red").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reverse_replace_is_not_a_merge() {
        let (_, reverse, backend) = indexes();

        let mut group = CommandGroup::new();
        reverse.queue_replace(&mut group, "a", &BTreeSet::from(["t1".to_string(), "t2".to_string()]));
        backend.execute_group(group).await.unwrap();

        let mut group = CommandGroup::new();
        reverse.queue_replace(&mut group, "a", &BTreeSet::from(["t3".to_string()]));
        backend.execute_group(group).await.unwrap();

        assert_eq!(
            reverse.tags_of("a").await.unwrap(),
            BTreeSet::from(["t3".to_string()])
        );
    }

    #[tokio::test]
    async fn test_reverse_replace_clears_first() {
        let (_, reverse, _) = indexes();

        let mut group = CommandGroup::new();
        reverse.queue_replace(&mut group, "a", &BTreeSet::from(["t".to_string()]));

        assert!(matches!(group.commands()[0], GroupCommand::SetClear(_)));
        assert!(matches!(group.commands()[1], GroupCommand::SetAdd { .. }));
    }

    #[tokio::test]
    async fn test_missing_records_are_empty() {
        let (forward, reverse, _) = indexes();
        assert!(forward.members("nothing").await.unwrap().is_empty());
        assert!(reverse.tags_of("nobody").await.unwrap().is_empty());
    }
}
