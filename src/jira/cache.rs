//! Caching implementations for Jira types.

use crate::cache::Cacheable;

use super::types::{IssueRecord, UserRecord};

impl Cacheable for IssueRecord {
  fn cache_key(&self) -> String {
    self.key.clone()
  }

  fn updated_at(&self) -> Option<&str> {
    Some(&self.updated)
  }

  fn entity_type() -> &'static str {
    "issue"
  }
}

impl Cacheable for UserRecord {
  fn cache_key(&self) -> String {
    self.account_id.clone()
  }

  fn updated_at(&self) -> Option<&str> {
    // Users don't carry a modification time
    None
  }

  fn entity_type() -> &'static str {
    "user"
  }
}
