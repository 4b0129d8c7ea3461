//! Core traits for cache operations

mod metrics;
mod serializer;
mod store;
mod tracing_metrics;

pub use metrics::{CacheMetrics, CacheOperation, NoopMetrics};
pub use serializer::{JsonSerializer, Serializer};
pub use store::KeyValueStore;
pub use tracing_metrics::TracingMetrics;

#[cfg(feature = "metrics")]
pub use metrics::MetricsCrateAdapter;
