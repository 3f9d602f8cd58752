//! Deadline index for finding expired documents without a full scan

use std::collections::{BTreeMap, HashMap, HashSet};

/// Keys ordered by absolute expiration deadline (Unix seconds)
///
/// Expired keys stay in the index until they are removed explicitly, so
/// the caller decides when an expired document is really gone.
#[derive(Debug, Default)]
pub struct ExpiryIndex {
    /// Keys grouped by deadline
    by_deadline: BTreeMap<u64, HashSet<String>>,
    /// Map of key -> deadline for O(log n) removal
    key_to_deadline: HashMap<String, u64>,
}

impl ExpiryIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `key` to expire at `deadline`, replacing any previous deadline
    pub fn schedule(&mut self, key: String, deadline: u64) {
        self.remove(&key);

        self.by_deadline
            .entry(deadline)
            .or_default()
            .insert(key.clone());
        self.key_to_deadline.insert(key, deadline);
    }

    /// Remove a key from the index
    pub fn remove(&mut self, key: &str) {
        if let Some(deadline) = self.key_to_deadline.remove(key) {
            if let Some(keys) = self.by_deadline.get_mut(&deadline) {
                keys.remove(key);
                if keys.is_empty() {
                    self.by_deadline.remove(&deadline);
                }
            }
        }
    }

    /// Check if a key is scheduled
    #[cfg(test)]
    pub fn contains(&self, key: &str) -> bool {
        self.key_to_deadline.contains_key(key)
    }

    /// Keys whose deadline is at or before `now`
    pub fn expired(&self, now: u64) -> Vec<String> {
        self.by_deadline
            .range(..=now)
            .flat_map(|(_, keys)| keys.iter().cloned())
            .collect()
    }

    /// Get the number of scheduled keys
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.key_to_deadline.len()
    }

    /// Check if empty
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.key_to_deadline.is_empty()
    }
}
