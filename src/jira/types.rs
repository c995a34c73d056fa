use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CacheError;

/// Validated issue identifier, e.g. `PROJ-123`.
///
/// Parsing is case-insensitive; the stored form is upper case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IssueKey(String);

impl IssueKey {
  pub fn parse(input: &str) -> Result<Self, CacheError> {
    let candidate = input.trim().to_uppercase();
    let (project, number) = candidate
      .split_once('-')
      .ok_or_else(|| CacheError::InvalidKey(input.to_string()))?;

    let mut project_chars = project.chars();
    let project_ok = project_chars
      .next()
      .is_some_and(|c| c.is_ascii_alphabetic())
      && project_chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    let number_ok = !number.is_empty() && number.chars().all(|c| c.is_ascii_digit());

    if project_ok && number_ok {
      Ok(Self(candidate))
    } else {
      Err(CacheError::InvalidKey(input.to_string()))
    }
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  pub fn project(&self) -> &str {
    self.0.split('-').next().unwrap_or(&self.0)
  }
}

impl fmt::Display for IssueKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl FromStr for IssueKey {
  type Err = CacheError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::parse(s)
  }
}

impl TryFrom<String> for IssueKey {
  type Error = CacheError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    Self::parse(&value)
  }
}

impl From<IssueKey> for String {
  fn from(key: IssueKey) -> Self {
    key.0
  }
}

/// A user as embedded in issue fields (assignee, reporter, comment author)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
  pub account_id: Option<String>,
  pub display_name: String,
}

/// A user resolved through the user lookup endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
  pub account_id: String,
  pub display_name: String,
  pub email: Option<String>,
  pub active: bool,
}

impl UserRecord {
  /// Stand-in used when an account cannot be resolved.
  pub fn placeholder(account_id: &str) -> Self {
    let display_name = if account_id.trim().is_empty() {
      "Unassigned".to_string()
    } else {
      format!("User {}", account_id)
    };
    Self {
      account_id: account_id.to_string(),
      display_name,
      email: None,
      active: false,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRecord {
  pub id: String,
  pub author: Option<UserRef>,
  pub created: String,
  pub body: String,
}

/// File attached to an issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRecord {
  pub id: String,
  pub filename: String,
  /// Size in bytes
  pub size: u64,
  pub mime_type: Option<String>,
  pub author: Option<UserRef>,
  pub created: String,
}

/// Lightweight reference to another issue (parent, subtask, epic child, link target)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRef {
  pub key: String,
  pub summary: String,
  pub status: Option<String>,
  pub issue_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkDirection {
  Inward,
  Outward,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueLink {
  pub id: String,
  pub link_type: String,
  pub direction: LinkDirection,
  /// Relation as read from this issue, e.g. "relates to", "is blocked by"
  pub relation: String,
  pub issue: IssueRef,
}

/// Full issue snapshot, as held by the cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRecord {
  pub key: String,
  pub summary: String,
  pub status: String,
  pub status_id: String,
  pub issue_type: String,
  pub priority: Option<String>,
  pub assignee: Option<UserRef>,
  pub reporter: Option<UserRef>,
  pub created: String,
  pub updated: String,
  pub description: Option<String>,
  #[serde(default)]
  pub labels: Vec<String>,
  #[serde(default)]
  pub comments: Vec<CommentRecord>,
  #[serde(default)]
  pub links: Vec<IssueLink>,
  #[serde(default)]
  pub attachments: Vec<AttachmentRecord>,
  pub parent: Option<IssueRef>,
  #[serde(default)]
  pub subtasks: Vec<IssueRef>,
  /// Child issues, populated for epics only
  #[serde(default)]
  pub children: Vec<IssueRef>,
}

impl IssueRecord {
  pub fn is_epic(&self) -> bool {
    self.issue_type.eq_ignore_ascii_case("epic")
  }

  /// Link to `other`, in either direction
  pub fn link_to(&self, other: &str) -> Option<&IssueLink> {
    self
      .links
      .iter()
      .find(|l| l.issue.key.eq_ignore_ascii_case(other))
  }

  pub fn to_ref(&self) -> IssueRef {
    IssueRef {
      key: self.key.clone(),
      summary: self.summary.clone(),
      status: Some(self.status.clone()),
      issue_type: Some(self.issue_type.clone()),
    }
  }
}

/// Summary of an issue for list views
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueSummary {
  pub key: String,
  pub summary: String,
  pub status: String,
  pub issue_type: String,
  pub assignee: Option<String>,
  pub priority: Option<String>,
  pub updated: String,
}

impl From<IssueSummary> for IssueRef {
  fn from(s: IssueSummary) -> Self {
    IssueRef {
      key: s.key,
      summary: s.summary,
      status: Some(s.status),
      issue_type: Some(s.issue_type),
    }
  }
}

/// Workflow transition available from an issue's current status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
  pub id: String,
  pub name: String,
  pub to_status: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkType {
  pub name: String,
  pub inward: String,
  pub outward: String,
}

/// Fields for a new issue
#[derive(Debug, Clone)]
pub struct NewIssue {
  pub project: String,
  pub summary: String,
  pub issue_type: String,
  pub parent: Option<String>,
  pub description: Option<String>,
  pub priority: Option<String>,
  pub labels: Vec<String>,
}

impl NewIssue {
  /// Same content as `source`, filed in `project`.
  pub fn copy_of(source: &IssueRecord, project: &str) -> Self {
    Self {
      project: project.to_string(),
      summary: source.summary.clone(),
      issue_type: source.issue_type.clone(),
      parent: None,
      description: source.description.clone(),
      priority: source.priority.clone(),
      labels: source.labels.clone(),
    }
  }
}

/// Single-field edits supported by the shell
#[derive(Debug, Clone)]
pub enum FieldUpdate {
  Summary(String),
  Description(String),
  /// Attach the issue to this epic
  Parent(String),
}

/// Filter saved on the Jira server and starred by the current user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavouriteFilter {
  pub id: String,
  pub name: String,
  pub jql: String,
  pub owner: Option<String>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_valid_key() {
    let key = IssueKey::parse("PROJ-123").unwrap();
    assert_eq!(key.as_str(), "PROJ-123");
    assert_eq!(key.project(), "PROJ");
  }

  #[test]
  fn test_parse_normalizes_case_and_whitespace() {
    let key = IssueKey::parse("  ab2_c-7 ").unwrap();
    assert_eq!(key.to_string(), "AB2_C-7");
  }

  #[test]
  fn test_parse_rejects_missing_hyphen() {
    assert!(matches!(
      IssueKey::parse("proj1"),
      Err(CacheError::InvalidKey(k)) if k == "proj1"
    ));
  }

  #[test]
  fn test_parse_rejects_bad_shapes() {
    for input in ["", "-1", "PROJ-", "1PROJ-2", "PROJ-12a", "PROJ 1", "PR-OJ-1"] {
      assert!(IssueKey::parse(input).is_err(), "{input} should be rejected");
    }
  }

  #[test]
  fn test_user_placeholder() {
    assert_eq!(UserRecord::placeholder("").display_name, "Unassigned");
    assert_eq!(UserRecord::placeholder("abc").display_name, "User abc");
  }

  #[test]
  fn test_issue_key_serde_validates() {
    let key: IssueKey = serde_json::from_str("\"proj-9\"").unwrap();
    assert_eq!(key.as_str(), "PROJ-9");
    assert!(serde_json::from_str::<IssueKey>("\"nope\"").is_err());
  }
}
