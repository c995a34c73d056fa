//! Cached Jira client that wraps an [`IssueService`] with a local record cache.
//!
//! Issue reads go through [`CachedJiraClient::get`], which decides per entry whether
//! the stored copy can be served, must be re-fetched, or has disappeared upstream.
//! Writes always go to Jira first and then replace the affected entries wholesale.

use std::collections::HashMap;
use std::sync::OnceLock;

use chrono::Duration;
use color_eyre::{eyre::eyre, Result};
use regex::Regex;
use tracing::{debug, info, warn};

use crate::cache::{
  CacheLayer, CacheResult, CacheStorage, CachedEntity, SqliteStorage, ValidationPolicy,
};
use crate::config::Config;
use crate::error::{CacheError, ServiceError};

use super::client::JiraClient;
use super::service::{IssueService, ServiceResult};
use super::types::{
  FavouriteFilter, FieldUpdate, IssueKey, IssueLink, IssueRecord, IssueSummary, LinkType,
  NewIssue, Transition, UserRecord,
};

const DEFAULT_FRESH_SECS: i64 = 30;
const DEFAULT_USER_TTL_DAYS: i64 = 7;

/// Outcome of checking a stored issue against Jira
enum Freshness {
  Current,
  Changed,
  Gone,
  /// Transient failure; the stored copy may still be served
  Unreachable(ServiceError),
  /// Jira answered but refused or garbled the check
  Failed(ServiceError),
}

impl Freshness {
  fn from_error(e: ServiceError) -> Self {
    if e.is_not_found() {
      Freshness::Gone
    } else if e.is_transient() {
      Freshness::Unreachable(e)
    } else {
      Freshness::Failed(e)
    }
  }
}

/// Jira client with transparent caching support.
pub struct CachedJiraClient<C: IssueService = JiraClient, S: CacheStorage = SqliteStorage> {
  inner: C,
  cache: CacheLayer<S>,
  policy: ValidationPolicy,
  fresh_for: Duration,
  user_ttl: Duration,
}

impl CachedJiraClient {
  /// Client for the configured instance. `persist = false` keeps the cache in memory.
  pub fn from_config(config: &Config, persist: bool) -> Result<Self> {
    let inner = JiraClient::new(&config.jira)?;
    let storage = if persist {
      SqliteStorage::open(&config.cache.dir)
    } else {
      SqliteStorage::in_memory()
    }
    .map_err(|e| eyre!("Failed to open cache: {}", e))?;

    Ok(
      Self::new(inner, storage)
        .with_policy(config.cache.policy)
        .with_fresh_for(config.cache.fresh_for)
        .with_user_ttl(config.cache.user_ttl),
    )
  }
}

impl<C: IssueService, S: CacheStorage> CachedJiraClient<C, S> {
  pub fn new(inner: C, storage: S) -> Self {
    Self {
      inner,
      cache: CacheLayer::new(storage),
      policy: ValidationPolicy::default(),
      fresh_for: Duration::seconds(DEFAULT_FRESH_SECS),
      user_ttl: Duration::days(DEFAULT_USER_TTL_DAYS),
    }
  }

  pub fn with_policy(mut self, policy: ValidationPolicy) -> Self {
    self.policy = policy;
    self
  }

  /// Window after storing during which an entry is served without any remote call.
  /// Zero disables it.
  pub fn with_fresh_for(mut self, fresh_for: Duration) -> Self {
    self.fresh_for = fresh_for;
    self
  }

  pub fn with_user_ttl(mut self, user_ttl: Duration) -> Self {
    self.user_ttl = user_ttl;
    self
  }

  pub fn service(&self) -> &C {
    &self.inner
  }

  // ==========================================================================
  // Issue records
  // ==========================================================================

  /// Return the best available record for `key`.
  ///
  /// `Ok(None)` means the issue does not exist (or is no longer visible); any
  /// stored copy has been removed. A stored copy that cannot be checked because
  /// Jira is unreachable is returned with [`CacheSource::Offline`](crate::cache::CacheSource).
  pub async fn get(&self, key: &str) -> Result<Option<CacheResult<IssueRecord>>, CacheError> {
    let key = IssueKey::parse(key)?;
    let key = key.as_str();

    let Some(cached) = self.cache.lookup::<IssueRecord>(key)? else {
      debug!(key, "cache miss");
      return match self.fetch_full(key).await {
        Ok(record) => {
          self.cache.store(&record)?;
          Ok(Some(CacheResult::from_network(record)))
        }
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e.into()),
      };
    };

    if !CacheLayer::<S>::is_expired(cached.cached_at, self.fresh_for) {
      debug!(key, "serving recently stored entry");
      return Ok(Some(CacheResult::from_cache(cached.entity, cached.cached_at)));
    }

    let freshness = match self.policy {
      ValidationPolicy::MaxAge(max_age)
        if CacheLayer::<S>::is_expired(cached.cached_at, max_age) =>
      {
        Freshness::Changed
      }
      ValidationPolicy::MaxAge(_) => Freshness::Current,
      ValidationPolicy::UpdatedTimestamp => self.check(&cached.entity).await,
    };

    match freshness {
      Freshness::Current => {
        debug!(key, "cache hit");
        Ok(Some(CacheResult::from_cache(cached.entity, cached.cached_at)))
      }
      Freshness::Gone => {
        info!(key, "issue gone upstream, evicting");
        self.cache.evict::<IssueRecord>(key)?;
        Ok(None)
      }
      Freshness::Unreachable(e) => {
        warn!(key, error = %e, "staleness check failed, serving cached copy");
        Ok(Some(CacheResult::offline(cached.entity, cached.cached_at)))
      }
      Freshness::Failed(e) => Err(e.into()),
      Freshness::Changed => self.replace(key, cached).await,
    }
  }

  /// Store `record` as the current copy of its issue.
  pub fn put(&self, record: &IssueRecord) -> Result<(), CacheError> {
    IssueKey::parse(&record.key)?;
    self.cache.store(record)?;
    Ok(())
  }

  /// Unconditionally re-fetch `key`. `Ok(None)` when it no longer exists.
  pub async fn refresh(&self, key: &str) -> Result<Option<IssueRecord>, CacheError> {
    let key = IssueKey::parse(key)?;
    let key = key.as_str();
    match self.fetch_full(key).await {
      Ok(record) => {
        self.cache.store(&record)?;
        Ok(Some(record))
      }
      Err(e) if e.is_not_found() => {
        self.cache.evict::<IssueRecord>(key)?;
        Ok(None)
      }
      Err(e) => Err(e.into()),
    }
  }

  pub fn evict(&self, key: &str) -> Result<bool, CacheError> {
    let key = IssueKey::parse(key)?;
    Ok(self.cache.evict::<IssueRecord>(key.as_str())?)
  }

  /// Drop every stored record and user. Returns how many entries were removed.
  pub fn clear(&self) -> Result<usize, CacheError> {
    Ok(self.cache.clear()?)
  }

  async fn check(&self, cached: &IssueRecord) -> Freshness {
    let updated = match self.inner.peek_updated(&cached.key).await {
      Ok(updated) => updated,
      Err(e) => return Freshness::from_error(e),
    };
    if updated != cached.updated {
      debug!(key = %cached.key, cached = %cached.updated, remote = %updated, "issue changed");
      return Freshness::Changed;
    }
    if !cached.is_epic() {
      return Freshness::Current;
    }

    // Adding a child does not touch the epic's own timestamp
    match self.inner.epic_children(&cached.key).await {
      Ok(children) if children != cached.children => {
        debug!(key = %cached.key, "epic children changed");
        Freshness::Changed
      }
      Ok(_) => Freshness::Current,
      Err(e) => Freshness::from_error(e),
    }
  }

  async fn replace(
    &self,
    key: &str,
    cached: CachedEntity<IssueRecord>,
  ) -> Result<Option<CacheResult<IssueRecord>>, CacheError> {
    match self.fetch_full(key).await {
      Ok(record) => {
        self.cache.store(&record)?;
        Ok(Some(CacheResult::from_network(record)))
      }
      Err(e) if e.is_not_found() => {
        info!(key, "issue gone upstream, evicting");
        self.cache.evict::<IssueRecord>(key)?;
        Ok(None)
      }
      Err(e) if e.is_transient() => {
        warn!(key, error = %e, "refetch failed, serving cached copy");
        Ok(Some(CacheResult::offline(cached.entity, cached.cached_at)))
      }
      Err(e) => Err(e.into()),
    }
  }

  async fn fetch_full(&self, key: &str) -> ServiceResult<IssueRecord> {
    let mut record = self.inner.get_issue(key).await?;
    if record.is_epic() {
      record.children = self.inner.epic_children(key).await?;
    }
    Ok(record)
  }

  /// Re-fetch after a write. The write already succeeded, so a failed
  /// refresh only drops the stale copy.
  async fn after_write(&self, key: &str) -> Result<Option<IssueRecord>, CacheError> {
    match self.refresh(key).await {
      Ok(record) => Ok(record),
      Err(CacheError::Service(e)) => {
        warn!(key, error = %e, "refresh after write failed");
        self.cache.evict::<IssueRecord>(key)?;
        Ok(None)
      }
      Err(e) => Err(e),
    }
  }

  fn evict_parent_of(&self, key: &str) -> Result<(), CacheError> {
    if let Some(cached) = self.cache.lookup::<IssueRecord>(key)? {
      if let Some(parent) = cached.entity.parent {
        self.cache.evict::<IssueRecord>(&parent.key)?;
      }
    }
    Ok(())
  }

  // ==========================================================================
  // Writes
  // ==========================================================================

  pub async fn add_comment(
    &self,
    key: &str,
    body: &str,
  ) -> Result<Option<IssueRecord>, CacheError> {
    let key = IssueKey::parse(key)?;
    self.inner.add_comment(key.as_str(), body).await?;
    self.after_write(key.as_str()).await
  }

  pub async fn update_field(
    &self,
    key: &str,
    update: &FieldUpdate,
  ) -> Result<Option<IssueRecord>, CacheError> {
    let key = IssueKey::parse(key)?;
    self.inner.update_fields(key.as_str(), update).await?;
    self.after_write(key.as_str()).await
  }

  /// Attach `key` to `epic`. Both the old and the new epic lose their entries.
  pub async fn set_parent(
    &self,
    key: &str,
    epic: &str,
  ) -> Result<Option<IssueRecord>, CacheError> {
    let key = IssueKey::parse(key)?;
    let epic = IssueKey::parse(epic)?;
    let update = FieldUpdate::Parent(epic.as_str().to_string());
    self.inner.update_fields(key.as_str(), &update).await?;
    self.evict_parent_of(key.as_str())?;
    self.cache.evict::<IssueRecord>(epic.as_str())?;
    self.after_write(key.as_str()).await
  }

  pub async fn transition(
    &self,
    key: &str,
    transition: &Transition,
  ) -> Result<Option<IssueRecord>, CacheError> {
    let key = IssueKey::parse(key)?;
    self.inner.apply_transition(key.as_str(), &transition.id).await?;
    self.after_write(key.as_str()).await
  }

  pub async fn assign(
    &self,
    key: &str,
    account_id: Option<&str>,
  ) -> Result<Option<IssueRecord>, CacheError> {
    let key = IssueKey::parse(key)?;
    self.inner.assign_issue(key.as_str(), account_id).await?;
    self.after_write(key.as_str()).await
  }

  /// Link `from` to `to` with `link_type`, `from` on the inward side.
  pub async fn link(
    &self,
    from: &str,
    to: &str,
    link_type: &str,
  ) -> Result<Option<IssueRecord>, CacheError> {
    let from = IssueKey::parse(from)?;
    let to = IssueKey::parse(to)?;
    self
      .inner
      .create_issue_link(link_type, from.as_str(), to.as_str())
      .await?;
    self.cache.evict::<IssueRecord>(to.as_str())?;
    self.after_write(from.as_str()).await
  }

  pub async fn unlink(
    &self,
    from: &str,
    link: &IssueLink,
  ) -> Result<Option<IssueRecord>, CacheError> {
    let from = IssueKey::parse(from)?;
    self.inner.delete_issue_link(&link.id).await?;
    self.cache.evict::<IssueRecord>(&link.issue.key)?;
    self.after_write(from.as_str()).await
  }

  /// Create an issue and cache it. The parent's entry is dropped since its
  /// children changed.
  pub async fn create(&self, issue: &NewIssue) -> Result<IssueRecord, CacheError> {
    let key = self.inner.create_issue(issue).await?;
    info!(%key, "created issue");
    if let Some(parent) = &issue.parent {
      self.cache.evict::<IssueRecord>(parent)?;
    }
    let record = self.fetch_full(&key).await?;
    self.put(&record)?;
    Ok(record)
  }

  /// File a copy of `source` in `project`, replay its comments and link the
  /// two with `link_type` (source inward). Attachments stay behind.
  pub async fn copy_issue(
    &self,
    source: &IssueRecord,
    project: &str,
    link_type: &str,
  ) -> Result<IssueRecord, CacheError> {
    let key = self
      .inner
      .create_issue(&NewIssue::copy_of(source, project))
      .await?;
    info!(%key, source = %source.key, "copied issue");

    for comment in &source.comments {
      self.inner.add_comment(&key, &comment.body).await?;
    }
    self
      .inner
      .create_issue_link(link_type, &source.key, &key)
      .await?;
    self.cache.evict::<IssueRecord>(&source.key)?;

    let record = self.fetch_full(&key).await?;
    self.put(&record)?;
    Ok(record)
  }

  pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
    let key = IssueKey::parse(key)?;
    self.inner.delete_issue(key.as_str()).await?;
    self.evict_parent_of(key.as_str())?;
    self.evict(key.as_str())?;
    info!(key = %key, "deleted issue");
    Ok(())
  }

  // ==========================================================================
  // Uncached pass-throughs
  // ==========================================================================

  pub async fn search(&self, jql: &str, limit: usize) -> ServiceResult<Vec<IssueSummary>> {
    self.inner.search_issues(jql, limit).await
  }

  pub async fn transitions(&self, key: &str) -> Result<Vec<Transition>, CacheError> {
    let key = IssueKey::parse(key)?;
    Ok(self.inner.list_transitions(key.as_str()).await?)
  }

  pub async fn link_types(&self) -> ServiceResult<Vec<LinkType>> {
    self.inner.list_link_types().await
  }

  pub async fn myself(&self) -> ServiceResult<UserRecord> {
    self.inner.myself().await
  }

  pub async fn favourite_filters(&self) -> ServiceResult<Vec<FavouriteFilter>> {
    self.inner.favourite_filters().await
  }

  pub async fn update_filter_jql(&self, filter: &FavouriteFilter, jql: &str) -> ServiceResult<()> {
    self.inner.update_filter_jql(&filter.id, jql).await
  }

  pub async fn delete_filter(&self, filter: &FavouriteFilter) -> ServiceResult<()> {
    self.inner.delete_filter(&filter.id).await
  }

  // ==========================================================================
  // Users
  // ==========================================================================

  /// Display information for an account. Never fails: unknown or unreachable
  /// accounts resolve to a placeholder.
  pub async fn resolve_user(&self, account_id: &str) -> UserRecord {
    self
      .lookup_user(account_id)
      .await
      .unwrap_or_else(|| UserRecord::placeholder(account_id))
  }

  async fn lookup_user(&self, account_id: &str) -> Option<UserRecord> {
    if account_id.trim().is_empty() {
      return None;
    }
    let result = self
      .cache
      .fetch_one(account_id, self.user_ttl, || self.inner.get_user(account_id))
      .await;
    match result {
      Ok(user) => Some(user.data),
      Err(e) => {
        warn!(account_id, error = %e, "user lookup failed");
        None
      }
    }
  }

  /// Replace `[~accountid:ID]` tokens with `@Display Name`. Unresolvable ids
  /// become `@ID`. Text without tokens is returned unchanged.
  pub async fn resolve_mentions(&self, text: &str) -> String {
    let pattern = mention_pattern();
    if !pattern.is_match(text) {
      return text.to_string();
    }

    let ids: Vec<String> = pattern
      .captures_iter(text)
      .map(|caps| caps[1].to_string())
      .collect();

    let mut names: HashMap<String, String> = HashMap::new();
    for id in ids {
      if names.contains_key(&id) {
        continue;
      }
      let name = match self.lookup_user(&id).await {
        Some(user) => user.display_name,
        None => id.clone(),
      };
      names.insert(id, name);
    }

    pattern
      .replace_all(text, |caps: &regex::Captures| {
        let id = &caps[1];
        format!("@{}", names.get(id).map(String::as_str).unwrap_or(id))
      })
      .into_owned()
  }
}

fn mention_pattern() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| {
    Regex::new(r"\[~accountid:([^\]]+)\]").expect("valid mention pattern")
  })
}

/// Pick the transition the user asked for, by transition name or target status.
pub fn find_transition<'a>(transitions: &'a [Transition], wanted: &str) -> Option<&'a Transition> {
  let wanted = wanted.trim();
  transitions
    .iter()
    .find(|t| t.name.eq_ignore_ascii_case(wanted))
    .or_else(|| {
      transitions
        .iter()
        .find(|t| t.to_status.eq_ignore_ascii_case(wanted))
    })
}
