//! Serde-deserializable types matching Jira API responses.
//!
//! These types are separate from domain types to allow clean deserialization
//! while keeping domain types focused on application needs. Every response is
//! normalized here, once; nothing past the client sees raw JSON.

use serde::Deserialize;
use std::collections::HashMap;

use super::types::{
  AttachmentRecord, CommentRecord, FavouriteFilter, IssueLink, IssueRecord, IssueRef,
  IssueSummary, LinkDirection, LinkType, Transition, UserRecord, UserRef,
};

// ============================================================================
// Common nested field types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiStatus {
  #[serde(default)]
  pub id: String,
  pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiIssueType {
  pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiUser {
  /// Server/Data Center users carry `name` instead of `accountId`
  #[serde(alias = "name")]
  pub account_id: Option<String>,
  #[serde(default)]
  pub display_name: String,
  pub email_address: Option<String>,
  #[serde(default = "default_true")]
  pub active: bool,
}

fn default_true() -> bool {
  true
}

#[derive(Debug, Deserialize)]
pub struct ApiPriority {
  pub name: String,
}

// ============================================================================
// Issue fields
// ============================================================================

#[derive(Debug, Deserialize, Default)]
pub struct ApiRefFields {
  #[serde(default)]
  pub summary: String,
  pub status: Option<ApiStatus>,
  #[serde(rename = "issuetype")]
  pub issue_type: Option<ApiIssueType>,
}

/// An issue as embedded in another issue's fields (parent, subtasks, links)
#[derive(Debug, Deserialize)]
pub struct ApiIssueRef {
  pub key: String,
  #[serde(default)]
  pub fields: ApiRefFields,
}

#[derive(Debug, Deserialize)]
pub struct ApiLinkType {
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub inward: String,
  #[serde(default)]
  pub outward: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiIssueLink {
  pub id: String,
  #[serde(rename = "type")]
  pub link_type: ApiLinkType,
  pub inward_issue: Option<ApiIssueRef>,
  pub outward_issue: Option<ApiIssueRef>,
}

#[derive(Debug, Deserialize)]
pub struct ApiComment {
  pub id: String,
  pub author: Option<ApiUser>,
  #[serde(default)]
  pub body: serde_json::Value,
  #[serde(default)]
  pub created: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ApiCommentPage {
  #[serde(default)]
  pub comments: Vec<ApiComment>,
  #[serde(default)]
  pub start_at: u64,
  #[serde(default)]
  pub max_results: u64,
  #[serde(default)]
  pub total: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiAttachment {
  pub id: String,
  #[serde(default)]
  pub filename: String,
  #[serde(default)]
  pub size: u64,
  pub mime_type: Option<String>,
  pub author: Option<ApiUser>,
  #[serde(default)]
  pub created: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct ApiIssueFields {
  #[serde(default)]
  pub summary: String,
  pub status: Option<ApiStatus>,
  #[serde(rename = "issuetype")]
  pub issue_type: Option<ApiIssueType>,
  pub assignee: Option<ApiUser>,
  pub reporter: Option<ApiUser>,
  pub priority: Option<ApiPriority>,
  #[serde(default)]
  pub labels: Vec<String>,
  #[serde(default)]
  pub created: String,
  #[serde(default)]
  pub updated: String,
  // Description is complex (can be string or ADF), handled separately
  pub description: Option<serde_json::Value>,
  pub parent: Option<ApiIssueRef>,
  #[serde(default)]
  pub subtasks: Vec<ApiIssueRef>,
  #[serde(rename = "issuelinks", default)]
  pub issue_links: Vec<ApiIssueLink>,
  pub comment: Option<ApiCommentPage>,
  #[serde(default)]
  pub attachment: Vec<ApiAttachment>,
  // Catch-all for custom fields (like epic link)
  #[serde(flatten)]
  pub extra: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct ApiIssue {
  pub key: String,
  #[serde(default)]
  pub fields: ApiIssueFields,
}

// ============================================================================
// Staleness check (fields=updated)
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiUpdatedFields {
  pub updated: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiUpdatedOnly {
  pub key: String,
  pub fields: ApiUpdatedFields,
}

// ============================================================================
// Search endpoint response
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSearchResponse {
  #[serde(default)]
  pub issues: Vec<ApiIssue>,
  #[serde(default)]
  pub start_at: u64,
  #[serde(default)]
  pub max_results: u64,
  #[serde(default)]
  pub total: u64,
}

// ============================================================================
// Transitions endpoint response
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiTransitionTo {
  #[serde(default)]
  pub id: String,
  #[serde(default)]
  pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiTransition {
  pub id: String,
  #[serde(default)]
  pub name: String,
  pub to: ApiTransitionTo,
}

#[derive(Debug, Deserialize)]
pub struct ApiTransitionsResponse {
  #[serde(default)]
  pub transitions: Vec<ApiTransition>,
}

// ============================================================================
// Links, creation, errors
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiLinkTypesResponse {
  #[serde(default)]
  pub issue_link_types: Vec<ApiLinkType>,
}

#[derive(Debug, Deserialize)]
pub struct ApiCreatedIssue {
  pub key: String,
}

// ============================================================================
// Filters
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiFilter {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub jql: String,
  pub owner: Option<ApiUser>,
}

/// Error body Jira sends with 4xx responses
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
  #[serde(default)]
  pub error_messages: Vec<String>,
  #[serde(default)]
  pub errors: HashMap<String, String>,
}

impl ApiErrorBody {
  /// Flatten into a single line, falling back to `raw` when the body is not Jira's shape.
  pub fn message(raw: &str) -> String {
    let body: ApiErrorBody = serde_json::from_str(raw).unwrap_or_default();
    let mut parts = body.error_messages;
    let mut field_errors: Vec<String> = body
      .errors
      .into_iter()
      .map(|(field, msg)| format!("{}: {}", field, msg))
      .collect();
    field_errors.sort();
    parts.extend(field_errors);

    if parts.is_empty() {
      raw.trim().chars().take(200).collect()
    } else {
      parts.join("; ")
    }
  }
}

// ============================================================================
// Conversions to domain types
// ============================================================================

impl From<ApiUser> for UserRef {
  fn from(u: ApiUser) -> Self {
    UserRef {
      account_id: u.account_id,
      display_name: u.display_name,
    }
  }
}

impl ApiUser {
  pub fn into_record(self, requested_id: &str) -> UserRecord {
    UserRecord {
      account_id: self.account_id.unwrap_or_else(|| requested_id.to_string()),
      display_name: self.display_name,
      email: self.email_address,
      active: self.active,
    }
  }
}

impl From<ApiAttachment> for AttachmentRecord {
  fn from(a: ApiAttachment) -> Self {
    AttachmentRecord {
      id: a.id,
      filename: a.filename,
      size: a.size,
      mime_type: a.mime_type,
      author: a.author.map(UserRef::from),
      created: a.created,
    }
  }
}

impl From<ApiFilter> for FavouriteFilter {
  fn from(f: ApiFilter) -> Self {
    FavouriteFilter {
      id: f.id,
      name: f.name,
      jql: f.jql,
      owner: f.owner.map(|u| u.display_name),
    }
  }
}

impl From<ApiIssueRef> for IssueRef {
  fn from(r: ApiIssueRef) -> Self {
    IssueRef {
      key: r.key,
      summary: r.fields.summary,
      status: r.fields.status.map(|s| s.name),
      issue_type: r.fields.issue_type.map(|t| t.name),
    }
  }
}

impl From<ApiComment> for CommentRecord {
  fn from(c: ApiComment) -> Self {
    CommentRecord {
      id: c.id,
      author: c.author.map(UserRef::from),
      created: c.created,
      body: extract_description(&c.body).unwrap_or_default(),
    }
  }
}

impl ApiIssueLink {
  fn into_link(self) -> Option<IssueLink> {
    let (direction, relation, other) = match (self.outward_issue, self.inward_issue) {
      (Some(other), _) => (LinkDirection::Outward, self.link_type.outward, other),
      (None, Some(other)) => (LinkDirection::Inward, self.link_type.inward, other),
      (None, None) => return None,
    };
    Some(IssueLink {
      id: self.id,
      link_type: self.link_type.name,
      direction,
      relation,
      issue: other.into(),
    })
  }
}

impl From<ApiLinkType> for LinkType {
  fn from(t: ApiLinkType) -> Self {
    LinkType {
      name: t.name,
      inward: t.inward,
      outward: t.outward,
    }
  }
}

impl From<ApiTransition> for Transition {
  fn from(t: ApiTransition) -> Self {
    Transition {
      id: t.id,
      name: t.name,
      to_status: t.to.name,
    }
  }
}

impl ApiIssue {
  pub fn into_summary(self) -> IssueSummary {
    let f = self.fields;
    IssueSummary {
      key: self.key,
      summary: f.summary,
      status: f.status.map(|s| s.name).unwrap_or_default(),
      issue_type: f.issue_type.map(|t| t.name).unwrap_or_default(),
      assignee: f.assignee.map(|u| u.display_name),
      priority: f.priority.map(|p| p.name),
      updated: f.updated,
    }
  }

  /// Normalize a full issue. `epic_field` names the custom field holding the epic
  /// link on instances that predate the `parent` field for epics.
  pub fn into_record(self, epic_field: Option<&str>) -> IssueRecord {
    let mut f = self.fields;

    let parent = match f.parent.take() {
      Some(parent) => Some(IssueRef::from(parent)),
      None => epic_field
        .and_then(|field| extract_epic_value(f.extra.get(field)))
        .map(|key| IssueRef {
          key,
          summary: String::new(),
          status: None,
          issue_type: Some("Epic".to_string()),
        }),
    };

    IssueRecord {
      key: self.key,
      summary: f.summary,
      description: f.description.as_ref().and_then(extract_description),
      status: f
        .status
        .as_ref()
        .map(|s| s.name.clone())
        .unwrap_or_default(),
      status_id: f.status.map(|s| s.id).unwrap_or_default(),
      issue_type: f.issue_type.map(|t| t.name).unwrap_or_default(),
      assignee: f.assignee.map(UserRef::from),
      reporter: f.reporter.map(UserRef::from),
      priority: f.priority.map(|p| p.name),
      labels: f.labels,
      created: f.created,
      updated: f.updated,
      comments: f
        .comment
        .map(|page| page.comments.into_iter().map(CommentRecord::from).collect())
        .unwrap_or_default(),
      links: f
        .issue_links
        .into_iter()
        .filter_map(ApiIssueLink::into_link)
        .collect(),
      parent,
      subtasks: f.subtasks.into_iter().map(IssueRef::from).collect(),
      children: Vec::new(),
      attachments: f
        .attachment
        .into_iter()
        .map(AttachmentRecord::from)
        .collect(),
    }
  }
}

// ============================================================================
// Helpers
// ============================================================================

/// Extract epic value from a custom field
/// Epic fields can be:
/// - A string (epic key like "PROJ-123")
/// - An object with "key" or "name" field
/// - null
fn extract_epic_value(value: Option<&serde_json::Value>) -> Option<String> {
  let value = value?;

  if let Some(s) = value.as_str() {
    return Some(s.to_string());
  }

  if let Some(obj) = value.as_object() {
    if let Some(key) = obj.get("key").and_then(|v| v.as_str()) {
      return Some(key.to_string());
    }
    if let Some(name) = obj.get("name").and_then(|v| v.as_str()) {
      return Some(name.to_string());
    }
  }

  None
}

/// Extract plain text from Jira's ADF or plain text format
pub fn extract_description(value: &serde_json::Value) -> Option<String> {
  // API v2 delivers plain strings
  if let Some(s) = value.as_str() {
    return Some(s.to_string());
  }

  // ADF document (API v3)
  if let Some(content) = value.get("content").and_then(|v| v.as_array()) {
    let mut text = String::new();
    extract_adf_text(content, &mut text);
    let text = text.trim_end().to_string();
    if !text.is_empty() {
      return Some(text);
    }
  }

  None
}

/// Recursively extract text from ADF content.
/// Mentions are written back as `[~accountid:...]` tokens so they resolve the same
/// way as in v2 bodies.
fn extract_adf_text(content: &[serde_json::Value], output: &mut String) {
  for node in content {
    let Some(node_type) = node.get("type").and_then(|v| v.as_str()) else {
      continue;
    };
    match node_type {
      "text" => {
        if let Some(text) = node.get("text").and_then(|v| v.as_str()) {
          output.push_str(text);
        }
      }
      "mention" => {
        if let Some(id) = node.pointer("/attrs/id").and_then(|v| v.as_str()) {
          output.push_str(&format!("[~accountid:{}]", id));
        }
      }
      "hardBreak" => output.push('\n'),
      _ => {
        if let Some(children) = node.get("content").and_then(|v| v.as_array()) {
          extract_adf_text(children, output);
        }
        if matches!(node_type, "paragraph" | "heading" | "listItem") {
          output.push('\n');
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn full_issue_json() -> serde_json::Value {
    json!({
      "key": "PROJ-7",
      "fields": {
        "summary": "Fix login",
        "status": { "id": "3", "name": "In Progress" },
        "issuetype": { "name": "Story" },
        "priority": { "name": "High" },
        "assignee": { "accountId": "a-1", "displayName": "Ada Lovelace" },
        "reporter": { "accountId": "a-2", "displayName": "Alan Turing" },
        "labels": ["auth"],
        "created": "2024-05-01T10:00:00.000+0000",
        "updated": "2024-05-02T11:30:00.000+0000",
        "description": "Users cannot log in",
        "parent": { "key": "PROJ-1", "fields": { "summary": "Auth epic", "issuetype": { "name": "Epic" } } },
        "subtasks": [
          { "key": "PROJ-8", "fields": { "summary": "Write test", "status": { "id": "1", "name": "To Do" } } }
        ],
        "issuelinks": [
          {
            "id": "100",
            "type": { "name": "Blocks", "inward": "is blocked by", "outward": "blocks" },
            "inwardIssue": { "key": "PROJ-9", "fields": { "summary": "Infra" } }
          },
          {
            "id": "101",
            "type": { "name": "Relates", "inward": "relates to", "outward": "relates to" },
            "outwardIssue": { "key": "OPS-2", "fields": { "summary": "Runbook" } }
          }
        ],
        "comment": {
          "comments": [
            { "id": "10", "author": { "displayName": "Ada Lovelace" }, "body": "ping [~accountid:a-2]", "created": "2024-05-02T09:00:00.000+0000" }
          ],
          "startAt": 0, "maxResults": 50, "total": 1
        },
        "attachment": [
          {
            "id": "500", "filename": "trace.log", "size": 4096, "mimeType": "text/plain",
            "author": { "accountId": "a-2", "displayName": "Alan Turing" },
            "created": "2024-05-02T08:00:00.000+0000",
            "content": "https://jira.example.com/secure/attachment/500/trace.log"
          }
        ],
        "customfield_10014": null
      }
    })
  }

  #[test]
  fn test_full_issue_normalization() {
    let issue: ApiIssue = serde_json::from_value(full_issue_json()).unwrap();
    let record = issue.into_record(Some("customfield_10014"));

    assert_eq!(record.key, "PROJ-7");
    assert_eq!(record.status, "In Progress");
    assert_eq!(record.status_id, "3");
    assert_eq!(record.issue_type, "Story");
    assert_eq!(record.priority.as_deref(), Some("High"));
    assert_eq!(record.assignee.unwrap().display_name, "Ada Lovelace");
    assert_eq!(record.reporter.unwrap().account_id.as_deref(), Some("a-2"));
    assert_eq!(record.updated, "2024-05-02T11:30:00.000+0000");
    assert_eq!(record.description.as_deref(), Some("Users cannot log in"));
    assert_eq!(record.parent.unwrap().key, "PROJ-1");
    assert_eq!(record.subtasks[0].status.as_deref(), Some("To Do"));
    assert_eq!(record.comments.len(), 1);
    assert_eq!(record.comments[0].body, "ping [~accountid:a-2]");
    assert_eq!(record.attachments.len(), 1);
    assert_eq!(record.attachments[0].filename, "trace.log");
    assert_eq!(record.attachments[0].size, 4096);
    assert_eq!(record.attachments[0].mime_type.as_deref(), Some("text/plain"));
  }

  #[test]
  fn test_favourite_filter_conversion() {
    let filters: Vec<ApiFilter> = serde_json::from_value(json!([
      {
        "id": "10001", "name": "My bugs", "jql": "type = Bug AND assignee = currentUser()",
        "owner": { "accountId": "a-1", "displayName": "Ada Lovelace" },
        "favourite": true
      },
      { "id": "10002", "name": "No jql" }
    ]))
    .unwrap();
    let filters: Vec<FavouriteFilter> = filters.into_iter().map(FavouriteFilter::from).collect();
    assert_eq!(filters[0].owner.as_deref(), Some("Ada Lovelace"));
    assert_eq!(filters[0].jql, "type = Bug AND assignee = currentUser()");
    assert_eq!(filters[1].jql, "");
    assert!(filters[1].owner.is_none());
  }

  #[test]
  fn test_link_direction_and_relation() {
    let issue: ApiIssue = serde_json::from_value(full_issue_json()).unwrap();
    let record = issue.into_record(None);

    let blocked = record.link_to("PROJ-9").unwrap();
    assert_eq!(blocked.direction, LinkDirection::Inward);
    assert_eq!(blocked.relation, "is blocked by");

    let relates = record.link_to("ops-2").unwrap();
    assert_eq!(relates.direction, LinkDirection::Outward);
    assert_eq!(relates.link_type, "Relates");
  }

  #[test]
  fn test_parent_from_epic_link_field() {
    let issue: ApiIssue = serde_json::from_value(json!({
      "key": "PROJ-20",
      "fields": { "summary": "Task", "customfield_10014": "PROJ-3" }
    }))
    .unwrap();
    let record = issue.into_record(Some("customfield_10014"));
    assert_eq!(record.parent.unwrap().key, "PROJ-3");
  }

  #[test]
  fn test_missing_fields_default() {
    let issue: ApiIssue = serde_json::from_value(json!({ "key": "PROJ-2" })).unwrap();
    let record = issue.into_record(None);
    assert_eq!(record.summary, "");
    assert!(record.assignee.is_none());
    assert!(record.comments.is_empty());
  }

  #[test]
  fn test_extract_adf_description_with_mention() {
    let adf = json!({
      "type": "doc",
      "content": [
        { "type": "paragraph", "content": [
          { "type": "text", "text": "Hello " },
          { "type": "mention", "attrs": { "id": "a-9", "text": "@Grace" } }
        ]},
        { "type": "paragraph", "content": [ { "type": "text", "text": "Second" } ] }
      ]
    });
    assert_eq!(
      extract_description(&adf).as_deref(),
      Some("Hello [~accountid:a-9]\nSecond")
    );
  }

  #[test]
  fn test_error_body_message() {
    let raw = r#"{"errorMessages":["Issue does not exist"],"errors":{"summary":"required"}}"#;
    assert_eq!(
      ApiErrorBody::message(raw),
      "Issue does not exist; summary: required"
    );
    assert_eq!(ApiErrorBody::message("<html>oops</html>"), "<html>oops</html>");
  }
}
