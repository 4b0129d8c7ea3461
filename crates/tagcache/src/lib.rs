//! tagcache: Tag-indexed key/value cache over Redis-style stores
//!
//! # Features
//!
//! - **Tag-based invalidation** through server-side reverse-index sets
//! - **Pipelined writes**: value, tag index and expiry in one round trip
//! - **Flexible expiry**: durations, date strings or seconds from now
//! - **Namespacing** of keys and tags per tenant
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use tagcache::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//!     let cache = TaggedCache::new(MemoryStore::with_defaults());
//!
//!     cache
//!         .set("product/1", "<html>", EntryOpts::new().ttl_secs(60).tag("product"))
//!         .await?;
//!
//!     assert_eq!(cache.get("product/1").await?.as_deref(), Some("<html>"));
//!
//!     cache.delete_by_tags(["product"]).await?;
//!     assert_eq!(cache.get_or("product/1", "gone").await?, "gone");
//!
//!     Ok(())
//! }
//! ```

mod cache;
mod items;

// Re-export core
pub use tagcache_core::*;

// Re-export storage
#[cfg(feature = "memory")]
pub use tagcache_storage::{MemoryConfig, MemoryStore};

#[cfg(feature = "redis")]
pub use tagcache_storage::{RedisConfig, RedisStore};

pub use cache::{TaggedCache, TaggedCacheConfig};
pub use items::{CacheItem, CacheItemManager, SearchAttribute, SearchCriteria};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        BulkOptions, BulkOpts, CacheError, CacheItem, CacheItemManager, EntryOptions, EntryOpts,
        Expiry, KeyValueStore, Result, TaggedCache, TaggedCacheConfig,
    };

    #[cfg(feature = "memory")]
    pub use crate::{MemoryConfig, MemoryStore};

    #[cfg(feature = "redis")]
    pub use crate::{RedisConfig, RedisStore};
}
