//! Static page cache
//!
//! Writes rendered pages under a cache root so a front-end web server can
//! serve them directly, and purges them again, keeping the cache-bust
//! tracking table in step.

pub mod clear;
pub mod path;
pub mod tracking;
pub mod writer;

// Re-export main types
pub use clear::ClearStrategy;
pub use path::{INDEX_FILE, cache_entry};
pub use tracking::{
    LazyTrackingStore, SqliteTrackingStore, TrackingRecord, TrackingStats, TrackingStore,
};
pub use writer::{
    CacheConfiguration, ClearStats, Collaborators, HandledContent, SkipReason, StaticCacheWriter,
    WriteOutcome, strip_markers,
};
