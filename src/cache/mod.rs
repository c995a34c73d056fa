//! Generic caching layer for data persistence and offline support.
//!
//! This module provides a Jira-agnostic caching mechanism that:
//! - Caches entities with key + updated_at fields
//! - Serves entries within a freshness or age window without touching the network
//! - Provides basic offline mode (serve stale cache when network unavailable)

mod layer;
mod storage;
mod traits;

pub use layer::CacheLayer;
pub use storage::{CacheStorage, CachedEntity, SqliteStorage};
pub use traits::{CacheResult, CacheSource, Cacheable, ValidationPolicy};
