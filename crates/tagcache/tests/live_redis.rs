//! Live tests against a running Redis server.
//!
//! - Marked `#[ignore]`; run with `--features redis -- --ignored`.
//! - Reads the server from `TEST_REDIS_URL` (default `redis://127.0.0.1:6379/15`).
//! - Flushes the selected database.
#![cfg(feature = "redis")]

use tagcache::prelude::*;

type TestResult<T> = std::result::Result<T, Box<dyn std::error::Error>>;

fn redis_url() -> String {
    std::env::var("TEST_REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379/15".to_string())
}

async fn cache(namespace: &str) -> TestResult<TaggedCache<RedisStore>> {
    let store = RedisStore::connect(&RedisConfig::new(redis_url()).pool_size(2)).await?;
    Ok(TaggedCache::with_config(store, TaggedCacheConfig::with_namespace(namespace)))
}

#[tokio::test]
#[ignore]
async fn live_tagged_round_trip() -> TestResult<()> {
    let cache = cache("live").await?;
    cache.clear().await?;

    cache.set("a", "1", EntryOpts::new().tag("x")).await?;
    cache.set("b", "2", EntryOpts::new().ttl_secs(60).tags(["x", "y"])).await?;

    let found = cache.get_many(["a", "b", "c"]).await?;
    assert_eq!(found["a"].as_deref(), Some("1"));
    assert_eq!(found["b"].as_deref(), Some("2"));
    assert_eq!(found["c"], None);

    assert_eq!(cache.get_by_tags(["y"]).await?.len(), 1);

    cache.delete_by_tags(["x"]).await?;
    assert_eq!(cache.get_or("a", "default").await?, "default");
    assert_eq!(cache.get_or("b", "default").await?, "default");

    // "y" still lists the deleted "b"
    assert!(cache.delete_by_tags(["y"]).await?);
    Ok(())
}

#[tokio::test]
#[ignore]
async fn live_past_expiry_and_bulk_write() -> TestResult<()> {
    let cache = cache("live-expiry").await?;
    cache.clear().await?;

    cache
        .set("old", "v", EntryOpts::new().expires(Expiry::parse("2000-01-01 00:00:00")?))
        .await?;
    assert!(!cache.has("old").await?);

    let opts = BulkOpts::new()
        .expires_for("a", Expiry::in_seconds(60))
        .tag("a", "bulk")
        .tag("b", "bulk");
    cache.set_many([("a", "1"), ("b", "2")], opts).await?;
    assert_eq!(cache.get_by_tags(["bulk"]).await?.len(), 2);

    cache.clear().await?;
    assert_eq!(cache.get("a").await?, None);
    Ok(())
}
