//! Cache layer that orchestrates caching logic with network fetching.

use chrono::{DateTime, Duration, Utc};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use super::storage::{CacheStorage, CachedEntity, StorageResult};
use super::traits::{CacheResult, Cacheable};
use crate::error::{CacheError, ServiceError};

/// Cache layer that manages caching logic and network fetching.
///
/// This layer sits between the application and the network client,
/// providing transparent caching with offline support.
pub struct CacheLayer<S: CacheStorage> {
  storage: Arc<S>,
}

impl<S: CacheStorage> CacheLayer<S> {
  /// Create a new cache layer with the given storage backend.
  pub fn new(storage: S) -> Self {
    Self {
      storage: Arc::new(storage),
    }
  }

  /// Whether an entry captured at `cached_at` has outlived `max_age`.
  /// A zero `max_age` makes every entry expired.
  pub fn is_expired(cached_at: DateTime<Utc>, max_age: Duration) -> bool {
    Utc::now() - cached_at >= max_age
  }

  pub fn lookup<T: Cacheable>(&self, key: &str) -> StorageResult<Option<CachedEntity<T>>> {
    self.storage.get_entity(key)
  }

  /// Store an entity stamped with the current time, returning the stamp.
  pub fn store<T: Cacheable>(&self, entity: &T) -> StorageResult<DateTime<Utc>> {
    let now = Utc::now();
    self.store_at(entity, now)?;
    Ok(now)
  }

  pub fn store_at<T: Cacheable>(&self, entity: &T, cached_at: DateTime<Utc>) -> StorageResult<()> {
    self.storage.store_entity(entity, cached_at)
  }

  pub fn evict<T: Cacheable>(&self, key: &str) -> StorageResult<bool> {
    self.storage.remove_entity::<T>(key)
  }

  pub fn clear(&self) -> StorageResult<usize> {
    self.storage.clear()
  }

  /// Fetch a single entity with age-based caching.
  ///
  /// 1. Check cache - if younger than `max_age`, return immediately
  /// 2. If expired/missing, fetch from network
  /// 3. On network failure, return the expired copy (offline mode)
  /// 4. Update cache with new data
  pub async fn fetch_one<T, F, Fut>(
    &self,
    entity_key: &str,
    max_age: Duration,
    fetcher: F,
  ) -> Result<CacheResult<T>, CacheError>
  where
    T: Cacheable,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, ServiceError>>,
  {
    if let Some(cached) = self.storage.get_entity::<T>(entity_key)? {
      if !Self::is_expired(cached.cached_at, max_age) {
        debug!(entity = T::entity_type(), key = entity_key, "cache hit");
        return Ok(CacheResult::from_cache(cached.entity, cached.cached_at));
      }

      match fetcher().await {
        Ok(data) => {
          self.store(&data)?;
          Ok(CacheResult::from_network(data))
        }
        Err(e) => {
          warn!(
            entity = T::entity_type(),
            key = entity_key,
            error = %e,
            "refresh failed, serving expired cache entry"
          );
          Ok(CacheResult::offline(cached.entity, cached.cached_at))
        }
      }
    } else {
      let data = fetcher().await?;
      self.store(&data)?;
      Ok(CacheResult::from_network(data))
    }
  }
}

impl<S: CacheStorage> Clone for CacheLayer<S> {
  fn clone(&self) -> Self {
    Self {
      storage: Arc::clone(&self.storage),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::storage::SqliteStorage;
  use crate::cache::CacheSource;
  use reqwest::StatusCode;
  use serde::{Deserialize, Serialize};
  use std::sync::atomic::{AtomicUsize, Ordering};

  #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
  struct Profile {
    id: String,
    name: String,
  }

  impl Cacheable for Profile {
    fn cache_key(&self) -> String {
      self.id.clone()
    }

    fn updated_at(&self) -> Option<&str> {
      None
    }

    fn entity_type() -> &'static str {
      "profile"
    }
  }

  fn profile(name: &str) -> Profile {
    Profile {
      id: "p1".into(),
      name: name.into(),
    }
  }

  fn layer() -> CacheLayer<SqliteStorage> {
    CacheLayer::new(SqliteStorage::in_memory().unwrap())
  }

  fn server_error() -> ServiceError {
    ServiceError::Server {
      status: StatusCode::SERVICE_UNAVAILABLE,
      message: "down".into(),
    }
  }

  #[tokio::test]
  async fn test_miss_fetches_and_stores() {
    let cache = layer();
    let result = cache
      .fetch_one("p1", Duration::days(7), || async { Ok(profile("Ada")) })
      .await
      .unwrap();
    assert_eq!(result.source, CacheSource::Network);
    assert!(cache.lookup::<Profile>("p1").unwrap().is_some());
  }

  #[tokio::test]
  async fn test_fresh_entry_skips_fetcher() {
    let cache = layer();
    cache.store(&profile("Ada")).unwrap();

    let calls = AtomicUsize::new(0);
    let result = cache
      .fetch_one("p1", Duration::days(7), || async {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(profile("never"))
      })
      .await
      .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(result.source, CacheSource::CacheFresh);
    assert_eq!(result.data.name, "Ada");
  }

  #[tokio::test]
  async fn test_expired_entry_is_refetched() {
    let cache = layer();
    cache
      .store_at(&profile("Old"), Utc::now() - Duration::days(8))
      .unwrap();

    let result = cache
      .fetch_one("p1", Duration::days(7), || async { Ok(profile("New")) })
      .await
      .unwrap();
    assert_eq!(result.data.name, "New");
    assert_eq!(
      cache.lookup::<Profile>("p1").unwrap().unwrap().entity.name,
      "New"
    );
  }

  #[tokio::test]
  async fn test_expired_entry_served_offline_on_failure() {
    let cache = layer();
    cache
      .store_at(&profile("Old"), Utc::now() - Duration::days(8))
      .unwrap();

    let result = cache
      .fetch_one::<Profile, _, _>("p1", Duration::days(7), || async { Err(server_error()) })
      .await
      .unwrap();
    assert!(result.is_offline());
    assert_eq!(result.data.name, "Old");
  }

  #[tokio::test]
  async fn test_miss_with_failure_propagates() {
    let cache = layer();
    let result = cache
      .fetch_one::<Profile, _, _>("p1", Duration::days(7), || async { Err(server_error()) })
      .await;
    assert!(matches!(result, Err(CacheError::Service(_))));
  }

  #[test]
  fn test_zero_max_age_always_expired() {
    assert!(CacheLayer::<SqliteStorage>::is_expired(
      Utc::now(),
      Duration::zero()
    ));
    assert!(!CacheLayer::<SqliteStorage>::is_expired(
      Utc::now(),
      Duration::minutes(5)
    ));
  }
}
