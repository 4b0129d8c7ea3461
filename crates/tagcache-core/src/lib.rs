//! tagcache-core: Core traits and types for the tagcache library
//!
//! This crate provides the foundational types and traits used throughout
//! the tagcache ecosystem: the `KeyValueStore` seam, the pipelined command
//! model, expiry inputs and key namespacing.

mod error;
mod traits;
mod types;

pub use error::{CacheError, Result};
pub use traits::*;
pub use types::*;
