//! Cache storage trait and SQLite implementation.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use super::traits::Cacheable;
use crate::error::StorageError;

pub type StorageResult<T> = Result<T, StorageError>;

/// A single cached entity.
#[derive(Debug, Clone)]
pub struct CachedEntity<T> {
  /// The cached entity
  pub entity: T,
  /// When the entity was cached
  pub cached_at: DateTime<Utc>,
}

/// Trait for cache storage backends.
pub trait CacheStorage: Send + Sync {
  /// Get a single entity by key. Entries that no longer deserialize count as absent.
  fn get_entity<T: Cacheable>(&self, entity_key: &str) -> StorageResult<Option<CachedEntity<T>>>;

  /// Store a single entity, replacing any previous entry with the same key.
  fn store_entity<T: Cacheable>(&self, entity: &T, cached_at: DateTime<Utc>) -> StorageResult<()>;

  /// Remove one entity. Returns whether anything was removed.
  fn remove_entity<T: Cacheable>(&self, entity_key: &str) -> StorageResult<bool>;

  /// Remove every entry of every type. Returns the number removed.
  fn clear(&self) -> StorageResult<usize>;
}

/// SQLite-based cache storage implementation.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

impl SqliteStorage {
  /// Open (or create) the cache database inside `dir`.
  pub fn open(dir: &Path) -> StorageResult<Self> {
    std::fs::create_dir_all(dir)?;
    let path = Self::db_path(dir);
    debug!(path = %path.display(), "opening cache database");

    let conn = Connection::open(&path)?;
    Self::with_connection(conn)
  }

  /// In-memory database, gone when dropped.
  pub fn in_memory() -> StorageResult<Self> {
    Self::with_connection(Connection::open_in_memory()?)
  }

  pub fn db_path(dir: &Path) -> PathBuf {
    dir.join("cache.db")
  }

  fn with_connection(conn: Connection) -> StorageResult<Self> {
    conn.execute_batch(CACHE_SCHEMA)?;
    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
    self.conn.lock().map_err(|_| StorageError::Poisoned)
  }
}

/// Schema for cache tables.
const CACHE_SCHEMA: &str = r#"
-- Generic entity cache (stores serialized JSON)
CREATE TABLE IF NOT EXISTS entity_cache (
    entity_type TEXT NOT NULL,
    entity_key TEXT NOT NULL,
    data BLOB NOT NULL,
    updated_at TEXT,
    cached_at TEXT NOT NULL,
    PRIMARY KEY (entity_type, entity_key)
);
"#;

impl CacheStorage for SqliteStorage {
  fn get_entity<T: Cacheable>(&self, entity_key: &str) -> StorageResult<Option<CachedEntity<T>>> {
    let conn = self.lock()?;
    let entity_type = T::entity_type();

    let row: Option<(Vec<u8>, String)> = conn
      .query_row(
        "SELECT data, cached_at FROM entity_cache
         WHERE entity_type = ? AND entity_key = ?",
        params![entity_type, entity_key],
        |row| Ok((row.get(0)?, row.get(1)?)),
      )
      .optional()?;

    let Some((data, cached_at_str)) = row else {
      return Ok(None);
    };

    let entity: T = match serde_json::from_slice(&data) {
      Ok(entity) => entity,
      Err(e) => {
        warn!(entity_type, entity_key, error = %e, "discarding unreadable cache entry");
        return Ok(None);
      }
    };
    let cached_at = parse_datetime(&cached_at_str)?;

    Ok(Some(CachedEntity { entity, cached_at }))
  }

  fn store_entity<T: Cacheable>(&self, entity: &T, cached_at: DateTime<Utc>) -> StorageResult<()> {
    let conn = self.lock()?;
    let data = serde_json::to_vec(entity)?;

    conn.execute(
      "INSERT OR REPLACE INTO entity_cache (entity_type, entity_key, data, updated_at, cached_at)
       VALUES (?, ?, ?, ?, ?)",
      params![
        T::entity_type(),
        entity.cache_key(),
        data,
        entity.updated_at(),
        cached_at.to_rfc3339()
      ],
    )?;

    Ok(())
  }

  fn remove_entity<T: Cacheable>(&self, entity_key: &str) -> StorageResult<bool> {
    let conn = self.lock()?;
    let removed = conn.execute(
      "DELETE FROM entity_cache WHERE entity_type = ? AND entity_key = ?",
      params![T::entity_type(), entity_key],
    )?;
    Ok(removed > 0)
  }

  fn clear(&self) -> StorageResult<usize> {
    let conn = self.lock()?;
    Ok(conn.execute("DELETE FROM entity_cache", [])?)
  }
}

fn parse_datetime(s: &str) -> StorageResult<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| StorageError::Timestamp(format!("'{}': {}", s, e)))
}
