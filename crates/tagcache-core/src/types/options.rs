//! Write options and builders

use std::collections::HashMap;
use std::time::Duration;

use crate::Expiry;

/// Options for writing a single entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryOptions {
    /// When the entry expires; `None` never expires via this write
    pub expires: Option<Expiry>,
    /// Tags for grouped invalidation
    pub tags: Vec<String>,
}

/// Builder for EntryOptions with fluent API
#[derive(Debug, Clone, Default)]
pub struct EntryOpts(EntryOptions);

impl EntryOpts {
    /// Create new options builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the expiry
    pub fn expires(mut self, expiry: Expiry) -> Self {
        self.0.expires = Some(expiry);
        self
    }

    /// Expire after a duration
    pub fn ttl(self, duration: Duration) -> Self {
        self.expires(Expiry::after(duration))
    }

    /// Expire after a number of seconds
    pub fn ttl_secs(self, seconds: i64) -> Self {
        self.expires(Expiry::in_seconds(seconds))
    }

    /// Add multiple tags
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.0.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Add a single tag
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.0.tags.push(tag.into());
        self
    }

    /// Build the options
    pub fn build(self) -> EntryOptions {
        self.0
    }
}

impl From<EntryOpts> for EntryOptions {
    fn from(opts: EntryOpts) -> Self {
        opts.0
    }
}

impl From<Expiry> for EntryOptions {
    fn from(expiry: Expiry) -> Self {
        EntryOptions {
            expires: Some(expiry),
            ..Default::default()
        }
    }
}

impl From<Duration> for EntryOptions {
    fn from(ttl: Duration) -> Self {
        Expiry::after(ttl).into()
    }
}

/// Expiry policy of a bulk write
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BulkExpiry {
    /// No entry expires via this write
    #[default]
    Never,
    /// The same expiry applies to every entry
    Uniform(Expiry),
    /// Expiry per key; keys without one never expire via this write
    PerKey(HashMap<String, Expiry>),
}

impl BulkExpiry {
    /// Expiry for one key of the write
    pub fn for_key(&self, key: &str) -> Option<Expiry> {
        match self {
            BulkExpiry::Never => None,
            BulkExpiry::Uniform(expiry) => Some(*expiry),
            BulkExpiry::PerKey(map) => map.get(key).copied(),
        }
    }
}

/// Options for writing several entries at once
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkOptions {
    pub expires: BulkExpiry,
    /// Tags per key
    pub tags: HashMap<String, Vec<String>>,
}

/// Builder for BulkOptions with fluent API
#[derive(Debug, Clone, Default)]
pub struct BulkOpts(BulkOptions);

impl BulkOpts {
    /// Create new options builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one expiry to every entry
    pub fn expires(mut self, expiry: Expiry) -> Self {
        self.0.expires = BulkExpiry::Uniform(expiry);
        self
    }

    /// Set the expiry of one key
    ///
    /// Switches the policy to per-key; a uniform expiry set earlier is dropped.
    pub fn expires_for(mut self, key: impl Into<String>, expiry: Expiry) -> Self {
        match &mut self.0.expires {
            BulkExpiry::PerKey(map) => {
                map.insert(key.into(), expiry);
            }
            other => {
                *other = BulkExpiry::PerKey(HashMap::from([(key.into(), expiry)]));
            }
        }
        self
    }

    /// Add a tag to one key
    pub fn tag(mut self, key: impl Into<String>, tag: impl Into<String>) -> Self {
        self.0.tags.entry(key.into()).or_default().push(tag.into());
        self
    }

    /// Add several tags to one key
    pub fn tags<I, S>(mut self, key: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.0
            .tags
            .entry(key.into())
            .or_default()
            .extend(tags.into_iter().map(Into::into));
        self
    }

    /// Build the options
    pub fn build(self) -> BulkOptions {
        self.0
    }
}

impl From<BulkOpts> for BulkOptions {
    fn from(opts: BulkOpts) -> Self {
        opts.0
    }
}

impl From<Expiry> for BulkOptions {
    fn from(expiry: Expiry) -> Self {
        BulkOptions {
            expires: BulkExpiry::Uniform(expiry),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_default() {
        let opts = EntryOpts::new().build();
        assert!(opts.expires.is_none());
        assert!(opts.tags.is_empty());
    }

    #[test]
    fn test_builder_fluent() {
        let opts = EntryOpts::new()
            .ttl_secs(60)
            .tags(["tag1", "tag2"])
            .tag("tag3")
            .build();

        assert_eq!(opts.expires, Some(Expiry::SecondsFromNow(60)));
        assert_eq!(opts.tags, vec!["tag1", "tag2", "tag3"]);
    }

    #[test]
    fn test_from_duration() {
        let opts: EntryOptions = Duration::from_secs(300).into();
        assert_eq!(opts.expires, Some(Expiry::Duration(Duration::from_secs(300))));
    }

    #[test]
    fn test_bulk_uniform_expiry() {
        let opts = BulkOpts::new().expires(Expiry::at(100)).build();
        assert_eq!(opts.expires.for_key("a"), Some(Expiry::At(100)));
        assert_eq!(opts.expires.for_key("b"), Some(Expiry::At(100)));
    }

    #[test]
    fn test_bulk_per_key_replaces_uniform() {
        let opts = BulkOpts::new()
            .expires(Expiry::at(100))
            .expires_for("a", Expiry::in_seconds(5))
            .expires_for("b", Expiry::at(7))
            .build();

        assert_eq!(opts.expires.for_key("a"), Some(Expiry::SecondsFromNow(5)));
        assert_eq!(opts.expires.for_key("b"), Some(Expiry::At(7)));
        assert_eq!(opts.expires.for_key("c"), None);
    }

    #[test]
    fn test_bulk_tags() {
        let opts = BulkOpts::new()
            .tag("a", "x")
            .tags("a", ["y"])
            .tags("b", ["x", "z"])
            .build();

        assert_eq!(opts.tags["a"], vec!["x", "y"]);
        assert_eq!(opts.tags["b"], vec!["x", "z"]);
    }
}
