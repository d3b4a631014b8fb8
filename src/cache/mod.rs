//! Generic in-memory query cache.
//!
//! This module provides a domain-agnostic caching mechanism that:
//! - Keeps one entry per query key for the lifetime of the cache
//! - Coalesces concurrent queries for the same key onto a single loader
//! - Groups entries under tags for bulk invalidation
//! - Stores failures as normalized display messages

mod layer;
mod traits;

pub use layer::QueryCache;
pub use traits::{CacheEntry, EntryState, QueryKey, Tag};
