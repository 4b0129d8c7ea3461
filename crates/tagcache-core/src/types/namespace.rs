//! Mapping of literal keys and tags to storage keys

use crate::{CacheError, Result};

/// Marker inserted before a tag name to form its index key
pub const TAG_MARKER: &str = "tag:";

/// Separator between a namespace and the key it scopes
pub const NAMESPACE_SEPARATOR: char = '-';

/// Prefix applied to every key and tag of one tenant
///
/// Keys map to `<ns>-<key>` and tags to `<ns>-tag:<tag>`. Without a
/// namespace, keys are stored verbatim and tags as `tag:<tag>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Namespace {
    prefix: String,
}

impl Namespace {
    /// Namespace scoping every key with `name`
    pub fn new(name: impl AsRef<str>) -> Self {
        let name = name.as_ref();
        if name.is_empty() {
            return Self::none();
        }
        Self {
            prefix: format!("{}{}", name, NAMESPACE_SEPARATOR),
        }
    }

    /// No prefix at all
    pub fn none() -> Self {
        Self::default()
    }

    /// The prefix including its separator; empty when unscoped
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Storage key for a literal key
    pub fn key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Storage key of the index set for a literal tag
    pub fn tag(&self, tag: &str) -> String {
        format!("{}{}{}", self.prefix, TAG_MARKER, tag)
    }

    /// Literal key for a storage key of this namespace
    pub fn strip<'a>(&self, storage_key: &'a str) -> Option<&'a str> {
        storage_key.strip_prefix(self.prefix.as_str())
    }

    /// Validate and map a literal key
    ///
    /// Keys starting with [`TAG_MARKER`] would collide with tag index sets.
    pub fn checked_key(&self, key: &str) -> Result<String> {
        if key.is_empty() {
            return Err(CacheError::invalid("cache key must not be empty"));
        }
        if key.starts_with(TAG_MARKER) {
            return Err(CacheError::invalid(format!(
                "cache key must not start with {:?}: {}",
                TAG_MARKER, key
            )));
        }
        Ok(self.key(key))
    }

    /// Validate and map a literal tag
    pub fn checked_tag(&self, tag: &str) -> Result<String> {
        if tag.is_empty() {
            return Err(CacheError::invalid("cache tag must not be empty"));
        }
        Ok(self.tag(tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoped_keys_and_tags() {
        let ns = Namespace::new("1.2");
        assert_eq!(ns.prefix(), "1.2-");
        assert_eq!(ns.key("product/list"), "1.2-product/list");
        assert_eq!(ns.tag("product"), "1.2-tag:product");
    }

    #[test]
    fn test_unscoped() {
        let ns = Namespace::none();
        assert_eq!(ns.key("t:1"), "t:1");
        assert_eq!(ns.tag("tag1"), "tag:tag1");
        assert_eq!(Namespace::new(""), ns);
    }

    #[test]
    fn test_strip() {
        let ns = Namespace::new("site");
        assert_eq!(ns.strip("site-key"), Some("key"));
        assert_eq!(ns.strip("other-key"), None);
        assert_eq!(Namespace::none().strip("key"), Some("key"));
    }

    #[test]
    fn test_empty_input_rejected() {
        let ns = Namespace::new("site");
        assert!(matches!(ns.checked_key(""), Err(CacheError::InvalidArgument(_))));
        assert!(matches!(ns.checked_tag(""), Err(CacheError::InvalidArgument(_))));
        assert_eq!(ns.checked_key("a").unwrap(), "site-a");
    }

    #[test]
    fn test_key_with_tag_marker_rejected() {
        for ns in [Namespace::new("site"), Namespace::none()] {
            let err = ns.checked_key("tag:x").unwrap_err();
            assert!(matches!(err, CacheError::InvalidArgument(_)));
        }
        // The marker only matters at the start
        assert_eq!(Namespace::none().checked_key("x-tag:y").unwrap(), "x-tag:y");
    }
}
