//! Typed cache items for callers that manage entries as records

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use tagcache_core::{CacheError, CacheMetrics, EntryOptions, Expiry, KeyValueStore, Result};

use crate::TaggedCache;

/// One cache entry as a record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheItem {
    id: Option<String>,
    value: String,
    expires: Option<Expiry>,
    tags: Vec<String>,
    site_id: Option<String>,
    modified: bool,
}

impl CacheItem {
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn set_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self.modified = true;
        self
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self.modified = true;
        self
    }

    pub fn expires(&self) -> Option<Expiry> {
        self.expires
    }

    pub fn set_expires(mut self, expires: Option<Expiry>) -> Self {
        self.expires = expires;
        self.modified = true;
        self
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn set_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self.modified = true;
        self
    }

    /// Site the item was created for
    pub fn site_id(&self) -> Option<&str> {
        self.site_id.as_deref()
    }

    /// Whether the item changed since it was created or loaded
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    fn options(&self) -> EntryOptions {
        EntryOptions {
            expires: self.expires,
            tags: self.tags.clone(),
        }
    }
}

/// Attribute a search over cache items may filter on
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchAttribute {
    pub code: &'static str,
    pub internal_code: &'static str,
    pub label: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub public: bool,
}

/// Filter, sort and slice for a search over cache items
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SearchCriteria {
    /// Equality conditions by attribute code
    pub conditions: HashMap<String, String>,
    pub offset: usize,
    pub limit: usize,
}

impl Default for SearchCriteria {
    fn default() -> Self {
        Self {
            conditions: HashMap::new(),
            offset: 0,
            limit: 100,
        }
    }
}

const ATTRIBUTES: &[SearchAttribute] = &[SearchAttribute {
    code: "cache.id",
    internal_code: "id",
    label: "Cache ID",
    kind: "string",
    public: false,
}];

/// Item-oriented facade over a [`TaggedCache`]
///
/// Items are saved whole: a modified item replaces its previous entry along
/// with its expiry and tags. The store cannot enumerate entries, so searches
/// yield nothing.
pub struct CacheItemManager<S, M = tagcache_core::NoopMetrics>
where
    S: KeyValueStore,
    M: CacheMetrics,
{
    cache: TaggedCache<S, M>,
    site_id: Option<String>,
}

impl<S, M> CacheItemManager<S, M>
where
    S: KeyValueStore,
    M: CacheMetrics,
{
    pub fn new(cache: TaggedCache<S, M>) -> Self {
        Self {
            cache,
            site_id: None,
        }
    }

    /// Stamp items created by this manager with `site_id`
    pub fn with_site(mut self, site_id: impl Into<String>) -> Self {
        self.site_id = Some(site_id.into());
        self
    }

    pub fn cache(&self) -> &TaggedCache<S, M> {
        &self.cache
    }

    /// A fresh, unmodified item
    pub fn create(&self) -> CacheItem {
        CacheItem {
            site_id: self.site_id.clone(),
            ..Default::default()
        }
    }

    /// Write a modified item, replacing any previous entry
    ///
    /// Unmodified items are returned untouched. Items without an id are
    /// rejected.
    pub async fn save(&self, item: CacheItem) -> Result<CacheItem> {
        let Some(id) = item.id.clone() else {
            return Err(CacheError::invalid("cache item has no id"));
        };
        if !item.modified {
            return Ok(item);
        }

        self.cache.delete(&id).await?;
        self.cache.set(&id, item.value.as_str(), item.options()).await?;
        debug!(target: "tagcache", id = %id, tags = item.tags.len(), "Saved cache item");

        Ok(CacheItem {
            modified: false,
            ..item
        })
    }

    /// Load an item by id
    pub async fn get(&self, id: &str) -> Result<CacheItem> {
        match self.cache.get(id).await? {
            Some(value) => Ok(CacheItem {
                id: Some(id.to_string()),
                value,
                site_id: self.site_id.clone(),
                ..Default::default()
            }),
            None => Err(CacheError::NotFound(id.to_string())),
        }
    }

    /// Delete items by id
    pub async fn delete<I, K>(&self, ids: I) -> Result<()>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        self.cache.delete_many(ids).await?;
        Ok(())
    }

    /// Search items; entries cannot be listed, so this is always empty
    pub async fn search(&self, criteria: &SearchCriteria) -> Result<Vec<CacheItem>> {
        debug!(target: "tagcache", conditions = criteria.conditions.len(), "Cache item search yields nothing");
        Ok(Vec::new())
    }

    /// Drop the entries of the given sites
    ///
    /// Entries carry no site marker in the store, so there is nothing to
    /// remove selectively and this does nothing.
    pub async fn clear_sites<I, T>(&self, site_ids: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let count = site_ids.into_iter().count();
        debug!(target: "tagcache", sites = count, "Ignoring per-site cache clear");
        Ok(())
    }

    /// Attributes searches may filter on
    pub fn search_attributes(&self) -> &'static [SearchAttribute] {
        ATTRIBUTES
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EntryOpts, MemoryStore};

    fn manager() -> CacheItemManager<MemoryStore> {
        CacheItemManager::new(TaggedCache::new(MemoryStore::with_defaults())).with_site("1.")
    }

    #[test]
    fn test_create_is_unmodified() {
        let item = manager().create();
        assert!(!item.is_modified());
        assert_eq!(item.site_id(), Some("1."));
        assert!(item.id().is_none());
    }

    #[tokio::test]
    async fn test_save_and_get() {
        let manager = manager();
        let item = manager
            .create()
            .set_id("product/1")
            .set_value("<html>")
            .set_tags(["product"]);

        let saved = manager.save(item).await.unwrap();
        assert!(!saved.is_modified());

        let loaded = manager.get("product/1").await.unwrap();
        assert_eq!(loaded.value(), "<html>");
        assert!(!loaded.is_modified());

        // The tags were written with the value
        manager.cache().delete_by_tags(["product"]).await.unwrap();
        assert!(matches!(
            manager.get("product/1").await,
            Err(CacheError::NotFound(id)) if id == "product/1"
        ));
    }

    #[tokio::test]
    async fn test_save_replaces_value_and_expiry() {
        let manager = manager();
        manager
            .cache()
            .set("k", "old", EntryOpts::new().expires(Expiry::in_seconds(3600)))
            .await
            .unwrap();

        let item = manager.create().set_id("k").set_value("new").set_tags(["b"]);
        manager.save(item).await.unwrap();
        assert_eq!(manager.get("k").await.unwrap().value(), "new");

        // A saved expiry replaces the entry's lifetime
        let loaded = manager.get("k").await.unwrap();
        let item = loaded.set_expires(Some(Expiry::at(1)));
        manager.save(item).await.unwrap();
        assert!(!manager.cache().has("k").await.unwrap());

        let item = manager.create().set_id("k").set_value("again").set_tags(["b"]);
        manager.save(item).await.unwrap();
        assert!(manager.cache().has("k").await.unwrap());
        manager.cache().delete_by_tags(["b"]).await.unwrap();
        assert!(manager.get("k").await.is_err());
    }

    #[tokio::test]
    async fn test_save_without_id() {
        let manager = manager();
        let item = manager.create().set_value("x");
        assert!(matches!(
            manager.save(item).await,
            Err(CacheError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_and_search() {
        let manager = manager();
        manager
            .save(manager.create().set_id("a").set_value("1"))
            .await
            .unwrap();
        manager.delete(["a"]).await.unwrap();
        assert!(manager.get("a").await.is_err());

        let found = manager.search(&SearchCriteria::default()).await.unwrap();
        assert!(found.is_empty());
        manager.clear_sites(["1."]).await.unwrap();
    }

    #[test]
    fn test_search_attributes() {
        let attrs = manager().search_attributes();
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].code, "cache.id");
        assert_eq!(attrs[0].label, "Cache ID");
        assert_eq!(attrs[0].kind, "string");
    }
}
