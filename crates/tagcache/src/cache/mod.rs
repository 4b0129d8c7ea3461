//! Tagged cache over a key/value store

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::Deserialize;
use tracing::debug;

use tagcache_core::{
    BulkExpiry, BulkOptions, CacheError, CacheMetrics, CacheOperation, EntryOptions, JsonSerializer,
    KeyValueStore, Namespace, NoopMetrics, Result, Serializer,
};

mod tags;

/// Configuration for TaggedCache
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TaggedCacheConfig {
    /// Namespace prefix for all keys and tags
    pub namespace: Option<String>,
}

impl TaggedCacheConfig {
    /// Create config with namespace
    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
        }
    }
}

/// Key/value cache with tag-based bulk invalidation
///
/// Values are opaque strings stored under namespaced keys. Each tag is a
/// server-side set of the storage keys tagged with it. The index is written
/// alongside the value but never transactionally, and expiring entries leave
/// their keys behind in tag sets until the tag is next invalidated.
///
/// Generic over:
/// - `S`: The key/value store (Memory, Redis)
/// - `M`: The metrics collector
pub struct TaggedCache<S, M = NoopMetrics>
where
    S: KeyValueStore,
    M: CacheMetrics,
{
    store: Arc<S>,
    metrics: Arc<M>,
    namespace: Namespace,
    serializer: JsonSerializer,
}

// Constructors for default metrics
impl<S: KeyValueStore> TaggedCache<S, NoopMetrics> {
    /// Create a new TaggedCache without namespace or metrics
    pub fn new(store: S) -> Self {
        Self::with_config(store, TaggedCacheConfig::default())
    }

    /// Create with custom config
    pub fn with_config(store: S, config: TaggedCacheConfig) -> Self {
        Self::from_shared(Arc::new(store), config)
    }

    /// Create over a store handle owned elsewhere
    pub fn from_shared(store: Arc<S>, config: TaggedCacheConfig) -> Self {
        Self::build(store, Arc::new(NoopMetrics), config)
    }
}

impl<S, M> TaggedCache<S, M>
where
    S: KeyValueStore,
    M: CacheMetrics,
{
    /// Create a TaggedCache with custom metrics
    pub fn with_metrics(store: S, metrics: M, config: TaggedCacheConfig) -> Self {
        Self::build(Arc::new(store), Arc::new(metrics), config)
    }

    fn build(store: Arc<S>, metrics: Arc<M>, config: TaggedCacheConfig) -> Self {
        let namespace = match config.namespace {
            Some(ns) => Namespace::new(ns),
            None => Namespace::none(),
        };
        Self {
            store,
            metrics,
            namespace,
            serializer: JsonSerializer,
        }
    }

    /// A cache over the same store handle with another namespace
    pub fn scoped(&self, namespace: impl AsRef<str>) -> Self {
        Self {
            namespace: Namespace::new(namespace),
            ..self.clone()
        }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// The underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get a value from cache
    ///
    /// Returns `None` on a miss; a miss is not an error.
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let storage_key = self.namespace.checked_key(key)?;
        let start = Instant::now();

        let value = self.store.get(&storage_key).await?;
        match value {
            Some(_) => self.metrics.record_hit(&storage_key),
            None => self.metrics.record_miss(&storage_key),
        }

        self.metrics.record_latency(CacheOperation::Get, start.elapsed());
        Ok(value)
    }

    /// Get a value, or `default` on a miss
    pub async fn get_or(&self, key: &str, default: impl Into<String>) -> Result<String> {
        Ok(self.get(key).await?.unwrap_or_else(|| default.into()))
    }

    /// Get several values with one multi-get
    ///
    /// Every distinct input key is present in the result; missing keys map
    /// to `None`. Repeated keys are looked up once.
    pub async fn get_many<I, K>(&self, keys: I) -> Result<HashMap<String, Option<String>>>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut unique = Vec::new();
        for key in keys {
            let key = key.as_ref();
            self.namespace.checked_key(key)?;
            if seen.insert(key.to_string()) {
                unique.push(key.to_string());
            }
        }

        if unique.is_empty() {
            return Ok(HashMap::new());
        }

        let start = Instant::now();
        let storage_keys: Vec<String> = unique.iter().map(|k| self.namespace.key(k)).collect();
        let values = self.store.multi_get(&storage_keys).await?;

        // Correlate by position; a short reply counts as misses
        let mut result = HashMap::with_capacity(unique.len());
        let mut hits = 0usize;
        let values = values.into_iter().chain(std::iter::repeat(None));
        for ((key, storage_key), value) in unique.into_iter().zip(&storage_keys).zip(values) {
            match value {
                Some(_) => {
                    hits += 1;
                    self.metrics.record_hit(storage_key);
                }
                None => self.metrics.record_miss(storage_key),
            }
            result.insert(key, value);
        }

        debug!(
            target: "tagcache",
            keys = result.len(),
            hits,
            "get_many"
        );

        self.metrics
            .record_latency(CacheOperation::GetMany, start.elapsed());
        Ok(result)
    }

    /// Get several values, substituting `default` for misses
    pub async fn get_many_or<I, K>(&self, keys: I, default: &str) -> Result<HashMap<String, String>>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let found = self.get_many(keys).await?;
        Ok(found
            .into_iter()
            .map(|(key, value)| (key, value.unwrap_or_else(|| default.to_string())))
            .collect())
    }

    /// Check if key exists in cache
    pub async fn has(&self, key: &str) -> Result<bool> {
        let storage_key = self.namespace.checked_key(key)?;
        let start = Instant::now();

        let exists = self.store.exists(&storage_key).await?;

        self.metrics.record_latency(CacheOperation::Has, start.elapsed());
        Ok(exists)
    }

    /// Set a value in cache
    ///
    /// The value, one index update per tag and the expiry are sent as one
    /// pipeline. Returns `true` if the batch produced results.
    pub async fn set(
        &self,
        key: &str,
        value: impl Into<String>,
        options: impl Into<EntryOptions>,
    ) -> Result<bool> {
        let storage_key = self.namespace.checked_key(key)?;
        let options = options.into();
        let tag_keys = options
            .tags
            .iter()
            .map(|tag| self.namespace.checked_tag(tag))
            .collect::<Result<Vec<_>>>()?;
        let expires_at = options.expires.map(|e| e.resolve_now()).transpose()?;
        let start = Instant::now();

        let mut pipe = self.store.pipeline();
        pipe.set(storage_key.as_str(), value);
        for tag_key in &tag_keys {
            pipe.set_add(tag_key.as_str(), storage_key.as_str());
        }
        if let Some(timestamp) = expires_at {
            pipe.expire_at(storage_key.as_str(), timestamp);
        }

        let replies = self.store.execute(pipe).await?;
        debug!(
            target: "tagcache",
            key = %storage_key,
            tags = tag_keys.len(),
            expires_at = ?expires_at,
            "set"
        );

        self.metrics.record_latency(CacheOperation::Set, start.elapsed());
        Ok(!replies.is_empty())
    }

    /// Set several values in one pipeline
    ///
    /// Queues one multi-set, then an absolute expiry for every key the
    /// options give one, then one index update per key and tag. Per-key
    /// options must only name keys present in `pairs`.
    pub async fn set_many<I, K, V>(&self, pairs: I, options: impl Into<BulkOptions>) -> Result<bool>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let options = options.into();
        let mut keys = Vec::new();
        let mut storage_pairs = Vec::new();
        for (key, value) in pairs {
            let key: String = key.into();
            let storage_key = self.namespace.checked_key(&key)?;
            storage_pairs.push((storage_key, value.into()));
            keys.push(key);
        }

        let known: HashSet<&str> = keys.iter().map(String::as_str).collect();
        let mut index_updates = Vec::new();
        for (key, tags) in &options.tags {
            if !known.contains(key.as_str()) {
                return Err(CacheError::invalid(format!("tags given for unknown key: {}", key)));
            }
            for tag in tags {
                index_updates.push((self.namespace.checked_tag(tag)?, self.namespace.key(key)));
            }
        }
        if let BulkExpiry::PerKey(map) = &options.expires {
            if let Some(key) = map.keys().find(|k| !known.contains(k.as_str())) {
                return Err(CacheError::invalid(format!("expiry given for unknown key: {}", key)));
            }
        }

        let now = Utc::now().timestamp();
        let mut expiries = Vec::new();
        for (key, (storage_key, _)) in keys.iter().zip(&storage_pairs) {
            if let Some(expiry) = options.expires.for_key(key) {
                expiries.push((storage_key.clone(), expiry.resolve(now)?));
            }
        }

        if storage_pairs.is_empty() {
            return Ok(true);
        }

        let start = Instant::now();
        let mut pipe = self.store.pipeline();
        pipe.multi_set(storage_pairs.clone());

        for (storage_key, timestamp) in expiries {
            pipe.expire_at(storage_key, timestamp);
        }
        for (tag_key, storage_key) in index_updates {
            pipe.set_add(tag_key, storage_key);
        }

        let replies = self.store.execute(pipe).await?;
        debug!(
            target: "tagcache",
            keys = storage_pairs.len(),
            commands = replies.len(),
            "set_many"
        );

        self.metrics
            .record_latency(CacheOperation::SetMany, start.elapsed());
        Ok(!replies.is_empty())
    }

    /// Delete a key from cache
    ///
    /// Its key stays in the index sets of its tags until they are invalidated.
    pub async fn delete(&self, key: &str) -> Result<bool> {
        self.delete_many([key]).await
    }

    /// Delete several keys with one store call
    pub async fn delete_many<I, K>(&self, keys: I) -> Result<bool>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let storage_keys = keys
            .into_iter()
            .map(|key| self.namespace.checked_key(key.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        if storage_keys.is_empty() {
            return Ok(true);
        }

        let start = Instant::now();
        let removed = self.store.delete_keys(&storage_keys).await?;
        debug!(target: "tagcache", keys = storage_keys.len(), removed, "delete");

        self.metrics
            .record_latency(CacheOperation::Delete, start.elapsed());
        Ok(true)
    }

    /// Remove every entry from the backing store
    ///
    /// This wipes all namespaces sharing the store: purging a single
    /// namespace would need a scan of the whole keyspace.
    pub async fn clear(&self) -> Result<bool> {
        let start = Instant::now();
        self.store.flush_all().await?;
        debug!(target: "tagcache", "clear");

        self.metrics.record_latency(CacheOperation::Clear, start.elapsed());
        Ok(true)
    }

    /// Get a value stored as JSON
    pub async fn get_json<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        match self.get(key).await? {
            Some(raw) => self.serializer.deserialize(&raw).map(Some),
            None => Ok(None),
        }
    }

    /// Store a value as JSON
    pub async fn set_json<T>(
        &self,
        key: &str,
        value: &T,
        options: impl Into<EntryOptions>,
    ) -> Result<bool>
    where
        T: serde::Serialize,
    {
        let raw = self.serializer.serialize(value)?;
        self.set(key, raw, options).await
    }
}

impl<S, M> Clone for TaggedCache<S, M>
where
    S: KeyValueStore,
    M: CacheMetrics,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            metrics: self.metrics.clone(),
            namespace: self.namespace.clone(),
            serializer: self.serializer,
        }
    }
}
