//! Ordered index of absolute key expiries

use std::collections::{BTreeMap, HashMap, HashSet};

/// Keys bucketed by the Unix second they expire at
///
/// Lets the store sweep due keys without scanning the whole keyspace.
#[derive(Debug, Default)]
pub struct ExpiryIndex {
    /// Expiry second -> keys expiring then
    buckets: BTreeMap<i64, HashSet<String>>,
    /// Key -> expiry second for O(1) removal
    key_to_bucket: HashMap<String, i64>,
}

impl ExpiryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `key` to expire at `timestamp`, replacing any earlier schedule
    pub fn schedule(&mut self, key: &str, timestamp: i64) {
        self.remove(key);
        self.buckets
            .entry(timestamp)
            .or_default()
            .insert(key.to_string());
        self.key_to_bucket.insert(key.to_string(), timestamp);
    }

    /// Remove a key from the index
    pub fn remove(&mut self, key: &str) {
        if let Some(timestamp) = self.key_to_bucket.remove(key) {
            if let Some(bucket) = self.buckets.get_mut(&timestamp) {
                bucket.remove(key);
                if bucket.is_empty() {
                    self.buckets.remove(&timestamp);
                }
            }
        }
    }

    /// Check if a key is scheduled
    #[cfg(test)]
    pub fn contains(&self, key: &str) -> bool {
        self.key_to_bucket.contains_key(key)
    }

    /// Remove and return every key due at or before `now`
    pub fn drain_due(&mut self, now: i64) -> Vec<String> {
        let later = match now.checked_add(1) {
            Some(next) => self.buckets.split_off(&next),
            None => BTreeMap::new(),
        };
        let due = std::mem::replace(&mut self.buckets, later);

        let mut expired = Vec::new();
        for key in due.into_values().flatten() {
            self.key_to_bucket.remove(&key);
            expired.push(key);
        }
        expired
    }

    /// Get the number of scheduled keys
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.key_to_bucket.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.key_to_bucket.is_empty()
    }

    /// Clear all scheduled keys
    pub fn clear(&mut self) {
        self.buckets.clear();
        self.key_to_bucket.clear();
    }
}
