//! Typed errors for the service boundary and the cache.
//!
//! The shell itself works with `color_eyre::Result`; these types exist where callers
//! need to tell outcomes apart (not found vs. transient, bad input vs. remote failure).

use reqwest::StatusCode;
use thiserror::Error;

/// Errors returned by an [`IssueService`](crate::jira::service::IssueService).
#[derive(Debug, Error)]
pub enum ServiceError {
  /// The record does not exist, or the credentials may not see it (404/403).
  #[error("{0} not found or not visible")]
  NotFound(String),

  #[error("authentication rejected by Jira (check JIRA_USERNAME and JIRA_API_TOKEN)")]
  Unauthorized,

  #[error("rate limited by Jira (retry after {retry_after:?}s)")]
  RateLimited { retry_after: Option<u64> },

  #[error("Jira server error {status}: {message}")]
  Server { status: StatusCode, message: String },

  #[error("Jira rejected the request ({status}): {message}")]
  Api { status: StatusCode, message: String },

  #[error("network error: {0}")]
  Network(#[from] reqwest::Error),

  #[error("unexpected response for {context}: {message}")]
  Decode { context: String, message: String },
}

impl ServiceError {
  pub fn is_not_found(&self) -> bool {
    matches!(self, ServiceError::NotFound(_))
  }

  /// Failures worth retrying later; a cached copy stays usable meanwhile.
  pub fn is_transient(&self) -> bool {
    match self {
      ServiceError::Network(_) | ServiceError::RateLimited { .. } => true,
      ServiceError::Server { .. } => true,
      _ => false,
    }
  }
}

/// Errors from the on-disk cache.
#[derive(Debug, Error)]
pub enum StorageError {
  #[error("cache database error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("cache serialization error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("cache directory error: {0}")]
  Io(#[from] std::io::Error),

  #[error("cache lock poisoned")]
  Poisoned,

  #[error("invalid timestamp in cache: {0}")]
  Timestamp(String),
}

/// Errors surfaced by the issue cache.
#[derive(Debug, Error)]
pub enum CacheError {
  /// Identifier does not have the `PROJECT-NUMBER` shape. Raised before any remote call.
  #[error("invalid issue key '{0}' (expected PROJECT-123)")]
  InvalidKey(String),

  #[error(transparent)]
  Service(#[from] ServiceError),

  #[error(transparent)]
  Storage(#[from] StorageError),
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_not_found_is_not_transient() {
    let err = ServiceError::NotFound("PROJ-1".into());
    assert!(err.is_not_found());
    assert!(!err.is_transient());
  }

  #[test]
  fn test_server_and_rate_limit_are_transient() {
    let server = ServiceError::Server {
      status: StatusCode::BAD_GATEWAY,
      message: "upstream".into(),
    };
    assert!(server.is_transient());
    assert!(ServiceError::RateLimited { retry_after: Some(5) }.is_transient());
  }

  #[test]
  fn test_api_error_is_permanent() {
    let err = ServiceError::Api {
      status: StatusCode::BAD_REQUEST,
      message: "Field 'summary' is required".into(),
    };
    assert!(!err.is_transient());
    assert!(!err.is_not_found());
    assert!(err.to_string().contains("summary"));
  }
}
