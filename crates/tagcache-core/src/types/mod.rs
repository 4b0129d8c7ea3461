//! Core types for cache operations

mod command;
mod expiry;
mod namespace;
mod options;

pub use command::{Command, Pipeline, Reply};
pub use expiry::{Expiry, MAX_TIMESTAMP};
pub use namespace::{Namespace, NAMESPACE_SEPARATOR, TAG_MARKER};
pub use options::{BulkExpiry, BulkOptions, BulkOpts, EntryOptions, EntryOpts};
