//! The remote boundary the cache and the shell talk to.

use async_trait::async_trait;

use crate::error::ServiceError;

use super::types::{
  FavouriteFilter, FieldUpdate, IssueRecord, IssueRef, IssueSummary, LinkType, NewIssue,
  Transition, UserRecord,
};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Operations against the issue tracker.
///
/// Implementations return normalized domain types; callers never see wire formats.
#[async_trait]
pub trait IssueService: Send + Sync {
  /// Full record: fields, every comment, links, subtasks. Epic children are not
  /// included; see [`IssueService::epic_children`].
  async fn get_issue(&self, key: &str) -> ServiceResult<IssueRecord>;

  /// Cheap staleness check returning only the `updated` timestamp.
  async fn peek_updated(&self, key: &str) -> ServiceResult<String>;

  async fn search_issues(&self, jql: &str, limit: usize) -> ServiceResult<Vec<IssueSummary>>;

  /// Issues whose parent (or epic link) is `epic_key`.
  async fn epic_children(&self, epic_key: &str) -> ServiceResult<Vec<IssueRef>>;

  async fn add_comment(&self, key: &str, body: &str) -> ServiceResult<()>;

  async fn update_fields(&self, key: &str, update: &FieldUpdate) -> ServiceResult<()>;

  async fn delete_issue(&self, key: &str) -> ServiceResult<()>;

  /// Returns the key of the created issue.
  async fn create_issue(&self, issue: &NewIssue) -> ServiceResult<String>;

  async fn create_issue_link(
    &self,
    link_type: &str,
    inward_key: &str,
    outward_key: &str,
  ) -> ServiceResult<()>;

  async fn delete_issue_link(&self, link_id: &str) -> ServiceResult<()>;

  async fn list_link_types(&self) -> ServiceResult<Vec<LinkType>>;

  async fn list_transitions(&self, key: &str) -> ServiceResult<Vec<Transition>>;

  async fn apply_transition(&self, key: &str, transition_id: &str) -> ServiceResult<()>;

  /// `None` unassigns.
  async fn assign_issue(&self, key: &str, account_id: Option<&str>) -> ServiceResult<()>;

  /// The authenticated user.
  async fn myself(&self) -> ServiceResult<UserRecord>;

  async fn get_user(&self, account_id: &str) -> ServiceResult<UserRecord>;

  /// Server-side filters the authenticated user marked as favourite.
  async fn favourite_filters(&self) -> ServiceResult<Vec<FavouriteFilter>>;

  async fn update_filter_jql(&self, filter_id: &str, jql: &str) -> ServiceResult<()>;

  async fn delete_filter(&self, filter_id: &str) -> ServiceResult<()>;
}
