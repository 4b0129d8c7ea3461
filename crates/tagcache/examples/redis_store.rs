use tagcache::prelude::*;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let redis_url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
    println!("Connecting to Redis at {}", redis_url);

    let mut config = RedisConfig::new(redis_url).pool_size(5);
    if let Ok(password) = std::env::var("REDIS_PASSWORD") {
        config = config.auth(password);
    }

    let store = match RedisStore::connect(&config).await {
        Ok(store) => store,
        Err(CacheError::AuthenticationFailed) => {
            eprintln!("Redis rejected the password");
            return Ok(());
        }
        Err(e) => {
            eprintln!("Failed to connect to Redis: {}", e);
            println!("Make sure Redis is running at 127.0.0.1:6379 or set REDIS_URL");
            return Ok(());
        }
    };

    let cache = TaggedCache::with_config(store, TaggedCacheConfig::with_namespace("example"));

    cache
        .set("user:1", "sachin", EntryOpts::new().ttl_secs(300).tags(["users", "admins"]))
        .await?;
    println!("user:1 = {:?}", cache.get("user:1").await?);

    cache.delete_by_tags(["admins"]).await?;
    println!("user:1 after invalidation = {}", cache.get_or("user:1", "<gone>").await?);

    Ok(())
}
