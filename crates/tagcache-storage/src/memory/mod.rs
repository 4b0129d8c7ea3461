//! In-memory key/value store

mod expiry_index;
mod store;

pub use store::{MemoryConfig, MemoryStore};
