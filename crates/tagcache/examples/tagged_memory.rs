use tagcache::TracingMetrics;
use tagcache::prelude::*;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::TRACE)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");

    let metrics = TracingMetrics::new().with_service_name("tagged-memory");
    let cache = TaggedCache::with_metrics(
        MemoryStore::with_defaults(),
        metrics,
        TaggedCacheConfig::with_namespace("shop"),
    );

    cache
        .set("product/1", "<li>Demo article</li>", EntryOpts::new().ttl_secs(300).tag("product"))
        .await?;

    let opts = BulkOpts::new()
        .expires(Expiry::parse("2099-12-31 23:59:59")?)
        .tag("catalog/1", "catalog")
        .tags("catalog/2", ["catalog", "product"]);
    cache
        .set_many([("catalog/1", "<ul>Home</ul>"), ("catalog/2", "<ul>Sale</ul>")], opts)
        .await?;

    println!("product entries: {:?}", cache.get_by_tags(["product"]).await?);

    cache.delete_by_tags(["product"]).await?;
    println!("after invalidation: {:?}", cache.get_many(["product/1", "catalog/1", "catalog/2"]).await?);

    Ok(())
}
