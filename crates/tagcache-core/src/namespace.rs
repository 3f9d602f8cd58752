//! Key namespacing per application and cache
//!
//! Every physical key written by one cache instance starts with a prefix
//! derived from the application identity and the cache name:
//!
//! ```text
//! tc_<12 hex chars of sha256(application \0 cache)>_<space>:<name>
//! ```
//!
//! The space marker separates entry values (`e`), the forward tag index
//! (`t`) and the reverse tag index (`r`).

use sha2::{Digest, Sha256};

/// Number of hex characters of the digest kept in the prefix
const HASH_LENGTH: usize = 12;

/// The three physical key spaces of a cache instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeySpace {
    /// Entry values, keyed by identifier
    Entry,
    /// Forward index, keyed by tag, members are identifiers
    ForwardTag,
    /// Reverse index, keyed by identifier, members are tags
    ReverseTag,
}

impl KeySpace {
    /// All spaces, in flush order
    pub const ALL: [KeySpace; 3] = [KeySpace::Entry, KeySpace::ForwardTag, KeySpace::ReverseTag];

    fn marker(&self) -> &'static str {
        match self {
            KeySpace::Entry => "e:",
            KeySpace::ForwardTag => "t:",
            KeySpace::ReverseTag => "r:",
        }
    }

    /// Get space as string label
    pub fn as_str(&self) -> &'static str {
        match self {
            KeySpace::Entry => "entry",
            KeySpace::ForwardTag => "forward_tag",
            KeySpace::ReverseTag => "reverse_tag",
        }
    }
}

/// Derives and applies the key prefix of one cache instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierNamespacer {
    prefix: String,
}

impl IdentifierNamespacer {
    /// Derive the namespace for `cache_name` inside `application_identity`
    pub fn new(application_identity: &str, cache_name: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(application_identity.as_bytes());
        hasher.update([0u8]);
        hasher.update(cache_name.as_bytes());
        let digest = hex::encode(hasher.finalize());

        Self {
            prefix: format!("tc_{}_", &digest[..HASH_LENGTH]),
        }
    }

    /// The bare prefix shared by all spaces
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Prefix of every key in `space`
    pub fn space_prefix(&self, space: KeySpace) -> String {
        format!("{}{}", self.prefix, space.marker())
    }

    /// Bytes a key in `space` spends before the caller supplied name
    pub fn overhead(&self, space: KeySpace) -> usize {
        self.prefix.len() + space.marker().len()
    }

    /// Physical key holding the value of `identifier`
    pub fn entry_key(&self, identifier: &str) -> String {
        self.key(KeySpace::Entry, identifier)
    }

    /// Physical key of the forward index set of `tag`
    pub fn forward_key(&self, tag: &str) -> String {
        self.key(KeySpace::ForwardTag, tag)
    }

    /// Physical key of the reverse index set of `identifier`
    pub fn reverse_key(&self, identifier: &str) -> String {
        self.key(KeySpace::ReverseTag, identifier)
    }

    /// The identifier as it is stored by the backend
    ///
    /// Other applications sharing the store can use this to read entries
    /// written by this cache.
    pub fn prefixed_identifier(&self, identifier: &str) -> String {
        self.entry_key(identifier)
    }

    /// Recover the identifier from a physical entry key
    pub fn identifier_from_entry_key<'a>(&self, key: &'a str) -> Option<&'a str> {
        key.strip_prefix(self.prefix.as_str())?
            .strip_prefix(KeySpace::Entry.marker())
    }

    fn key(&self, space: KeySpace, name: &str) -> String {
        let mut key = String::with_capacity(self.overhead(space) + name.len());
        key.push_str(&self.prefix);
        key.push_str(space.marker());
        key.push_str(name);
        key
    }
}
