//! Key/value store trait

use async_trait::async_trait;
use std::collections::HashSet;

use crate::{Pipeline, Reply, Result};

/// Primitive operations the tagged cache needs from its backing store
///
/// Implementations own no cache semantics: keys arrive already namespaced
/// and values are opaque strings. Any connection or protocol failure is
/// reported as [`CacheError::StoreUnavailable`](crate::CacheError).
#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    /// Get the value stored under `key`
    ///
    /// Returns `None` if the key doesn't exist or has expired.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Get several values at once
    ///
    /// Returns one slot per input key, in input order.
    async fn multi_get(&self, keys: &[String]) -> Result<Vec<Option<String>>>;

    /// Store a value, replacing any previous value and expiry
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Store several values at once
    async fn multi_set(&self, pairs: &[(String, String)]) -> Result<()>;

    /// Add a member to a server-side set, creating the set if absent
    ///
    /// Returns `true` if the member was newly added.
    async fn set_add(&self, set_key: &str, member: &str) -> Result<bool>;

    /// Read all members of a server-side set
    async fn set_members(&self, set_key: &str) -> Result<HashSet<String>>;

    /// Expire `key` at an absolute Unix timestamp
    ///
    /// Returns `false` if the key does not exist.
    async fn expire_at(&self, key: &str, timestamp: i64) -> Result<bool>;

    /// Expire `key` after `seconds` from now
    async fn expire_in(&self, key: &str, seconds: i64) -> Result<bool>;

    /// Delete keys of any type
    ///
    /// Returns the number of keys that existed.
    async fn delete_keys(&self, keys: &[String]) -> Result<u64>;

    /// Check if a key exists
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Remove every key from the store
    async fn flush_all(&self) -> Result<()>;

    /// Start an empty batch for this store
    fn pipeline(&self) -> Pipeline {
        Pipeline::new()
    }

    /// Send every queued command in one round trip
    ///
    /// Returns one reply per queued command, in queue order. A failed
    /// batch reports no partial results, though some commands may have
    /// been applied already.
    async fn execute(&self, pipeline: Pipeline) -> Result<Vec<Reply>>;
}
