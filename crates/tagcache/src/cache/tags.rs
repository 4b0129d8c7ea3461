//! Tag-based reads and invalidation

use std::collections::{BTreeSet, HashMap, HashSet};
use std::time::Instant;

use tracing::{debug, trace};

use tagcache_core::{CacheMetrics, CacheOperation, KeyValueStore, Reply, Result};

use super::TaggedCache;

impl<S, M> TaggedCache<S, M>
where
    S: KeyValueStore,
    M: CacheMetrics,
{
    /// Delete every entry carrying any of `tags`, and the tags' index sets
    ///
    /// Reads all index sets in one pipeline, then removes the union of their
    /// members together with the index sets in a single delete. Members whose
    /// entries already expired are deleted harmlessly. Entries written between
    /// the two round trips under one of the tags may survive.
    pub async fn delete_by_tags<I, T>(&self, tags: I) -> Result<bool>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let tag_keys = self.tag_keys(tags)?;
        if tag_keys.is_empty() {
            return Ok(true);
        }

        let start = Instant::now();
        let members = self.read_members(&tag_keys).await?;
        trace!(target: "tagcache", tags = tag_keys.len(), members = members.len(), "Collected tag members");

        let member_count = members.len();
        let mut doomed: Vec<String> = members.into_iter().collect();
        doomed.extend(tag_keys.iter().cloned());

        let removed = self.store.delete_keys(&doomed).await?;
        debug!(
            target: "tagcache",
            tags = tag_keys.len(),
            keys = member_count,
            removed,
            "delete_by_tags"
        );

        self.metrics.record_invalidation(tag_keys.len(), member_count);
        self.metrics
            .record_latency(CacheOperation::DeleteByTags, start.elapsed());
        Ok(true)
    }

    /// Get every live entry carrying any of `tags`
    ///
    /// Keys come back without the namespace prefix. Index members whose
    /// entries are gone are skipped.
    pub async fn get_by_tags<I, T>(&self, tags: I) -> Result<HashMap<String, String>>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let tag_keys = self.tag_keys(tags)?;
        if tag_keys.is_empty() {
            return Ok(HashMap::new());
        }

        let start = Instant::now();
        let members: Vec<String> = self.read_members(&tag_keys).await?.into_iter().collect();
        if members.is_empty() {
            self.metrics
                .record_latency(CacheOperation::GetByTags, start.elapsed());
            return Ok(HashMap::new());
        }

        let values = self.store.multi_get(&members).await?;
        let mut result = HashMap::new();
        for (storage_key, value) in members.iter().zip(values) {
            let (Some(value), Some(key)) = (value, self.namespace.strip(storage_key)) else {
                continue;
            };
            result.insert(key.to_string(), value);
        }

        debug!(
            target: "tagcache",
            tags = tag_keys.len(),
            members = members.len(),
            found = result.len(),
            "get_by_tags"
        );

        self.metrics
            .record_latency(CacheOperation::GetByTags, start.elapsed());
        Ok(result)
    }

    /// Validated, deduplicated index keys for `tags`
    fn tag_keys<I, T>(&self, tags: I) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut keys = Vec::new();
        for tag in tags {
            let key = self.namespace.checked_tag(tag.as_ref())?;
            if seen.insert(key.clone()) {
                keys.push(key);
            }
        }
        Ok(keys)
    }

    /// Union of the members of the index sets, read in one pipeline
    async fn read_members(&self, tag_keys: &[String]) -> Result<BTreeSet<String>> {
        let mut pipe = self.store.pipeline();
        for tag_key in tag_keys {
            pipe.set_members(tag_key.as_str());
        }

        let mut members = BTreeSet::new();
        for reply in self.store.execute(pipe).await? {
            members.extend(Reply::into_members(reply)?);
        }
        Ok(members)
    }
}
