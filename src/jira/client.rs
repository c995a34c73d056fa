use std::time::Duration;

use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use reqwest::header::{ACCEPT, RETRY_AFTER};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use tracing::{debug, instrument};
use url::Url;

use crate::config::{AuthType, JiraConfig};
use crate::error::ServiceError;
use crate::jira::api_types::{
  ApiComment, ApiCommentPage, ApiCreatedIssue, ApiErrorBody, ApiFilter, ApiIssue,
  ApiLinkTypesResponse, ApiSearchResponse, ApiTransitionsResponse, ApiUpdatedOnly, ApiUser,
};
use crate::jira::service::{IssueService, ServiceResult};
use crate::jira::types::{
  FavouriteFilter, FieldUpdate, IssueRecord, IssueRef, IssueSummary, LinkType, NewIssue,
  Transition, UserRecord,
};

const PAGE_SIZE: usize = 50;
const SEARCH_FIELDS: &str = "summary,status,issuetype,assignee,priority,updated";

#[derive(Clone)]
enum Auth {
  Basic { user: String, token: String },
  Bearer(String),
}

/// Jira REST v2 client
#[derive(Clone)]
pub struct JiraClient {
  http: reqwest::Client,
  site: Url,
  api: Url,
  auth: Auth,
  auth_type: AuthType,
  epic_link_field: Option<String>,
  epic_name_field: Option<String>,
}

impl JiraClient {
  pub fn new(config: &JiraConfig) -> Result<Self> {
    let site = Url::parse(&format!("{}/", config.url.trim_end_matches('/')))
      .map_err(|e| eyre!("Invalid Jira URL '{}': {}", config.url, e))?;
    let api = site
      .join("rest/api/2/")
      .map_err(|e| eyre!("Invalid Jira URL '{}': {}", config.url, e))?;

    let auth_type = config.auth_type.effective(&config.url);
    let auth = match (auth_type, &config.email) {
      (AuthType::Onpremise, _) => Auth::Bearer(config.token.clone()),
      (_, Some(email)) => Auth::Basic {
        user: email.clone(),
        token: config.token.clone(),
      },
      (_, None) => return Err(eyre!("Jira Cloud requires JIRA_USERNAME (account email)")),
    };

    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .user_agent(concat!("jirash/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      site,
      api,
      auth,
      auth_type,
      epic_link_field: config.epic_link_field.clone(),
      epic_name_field: config.epic_name_field.clone(),
    })
  }

  /// Web page for an issue
  pub fn browse_url(&self, key: &str) -> String {
    self
      .site
      .join(&format!("browse/{}", key))
      .map(String::from)
      .unwrap_or_else(|_| format!("{}browse/{}", self.site, key))
  }

  fn request(&self, method: Method, path: &str) -> ServiceResult<RequestBuilder> {
    let url = self.api.join(path).map_err(|e| ServiceError::Decode {
      context: path.to_string(),
      message: e.to_string(),
    })?;
    let builder = self
      .http
      .request(method, url)
      .header(ACCEPT, "application/json");

    Ok(match &self.auth {
      Auth::Basic { user, token } => builder.basic_auth(user, Some(token)),
      Auth::Bearer(token) => builder.bearer_auth(token),
    })
  }

  /// Send and map non-success statuses. `subject` names what was asked for.
  async fn send(&self, builder: RequestBuilder, subject: &str) -> ServiceResult<Response> {
    let response = builder.send().await?;
    let status = response.status();
    if status.is_success() {
      return Ok(response);
    }

    let retry_after = response
      .headers()
      .get(RETRY_AFTER)
      .and_then(|v| v.to_str().ok())
      .and_then(|v| v.trim().parse().ok());
    let body = response.text().await.unwrap_or_default();
    debug!(%status, subject, "request failed");
    Err(classify(status, subject, &body, retry_after))
  }

  async fn get_json<T: DeserializeOwned>(
    &self,
    path: &str,
    query: &[(&str, String)],
    subject: &str,
  ) -> ServiceResult<T> {
    let response = self
      .send(self.request(Method::GET, path)?.query(query), subject)
      .await?;
    decode(response, subject).await
  }

  async fn send_json(
    &self,
    method: Method,
    path: &str,
    body: &Value,
    subject: &str,
  ) -> ServiceResult<Response> {
    self
      .send(self.request(method, path)?.json(body), subject)
      .await
  }

  async fn fetch_comments(&self, key: &str) -> ServiceResult<Vec<ApiComment>> {
    let path = format!("issue/{}/comment", key);
    let mut comments = Vec::new();
    let mut start_at = 0usize;

    loop {
      let page: ApiCommentPage = self
        .get_json(
          &path,
          &[
            ("startAt", start_at.to_string()),
            ("maxResults", PAGE_SIZE.to_string()),
          ],
          key,
        )
        .await?;

      let count = page.comments.len();
      comments.extend(page.comments);

      if count == 0 || start_at + count >= page.total as usize {
        break;
      }
      start_at += count;
    }

    Ok(comments)
  }

  fn epic_children_jql(&self, epic_key: &str) -> String {
    let custom = self
      .epic_link_field
      .as_deref()
      .and_then(|field| field.strip_prefix("customfield_"));
    match custom {
      Some(id) => format!(
        "parent = {key} OR cf[{id}] = {key} ORDER BY key ASC",
        key = epic_key,
        id = id
      ),
      None => format!("parent = {} ORDER BY key ASC", epic_key),
    }
  }

  fn new_issue_fields(&self, issue: &NewIssue) -> Value {
    let mut fields = Map::new();
    fields.insert("project".into(), json!({ "key": issue.project }));
    fields.insert("summary".into(), json!(issue.summary));
    fields.insert("issuetype".into(), json!({ "name": issue.issue_type }));

    if let Some(description) = &issue.description {
      fields.insert("description".into(), json!(description));
    }
    if let Some(priority) = &issue.priority {
      fields.insert("priority".into(), json!({ "name": priority }));
    }
    if !issue.labels.is_empty() {
      fields.insert("labels".into(), json!(issue.labels));
    }

    let is_subtask = issue.issue_type.to_lowercase().replace('-', "") == "subtask";
    if let Some(parent) = &issue.parent {
      match &self.epic_link_field {
        Some(field) if !is_subtask && self.auth_type == AuthType::Onpremise => {
          fields.insert(field.clone(), json!(parent));
        }
        _ => {
          fields.insert("parent".into(), json!({ "key": parent }));
        }
      }
    }

    if issue.issue_type.eq_ignore_ascii_case("epic") {
      if let Some(field) = &self.epic_name_field {
        fields.insert(field.clone(), json!(issue.summary));
      }
    }

    json!({ "fields": fields })
  }

  /// Cloud and team-managed projects use `parent`; Server uses the epic link field.
  fn parent_field(&self, epic_key: &str) -> Value {
    match &self.epic_link_field {
      Some(field) if self.auth_type == AuthType::Onpremise => {
        let mut fields = Map::new();
        fields.insert(field.clone(), json!(epic_key));
        Value::Object(fields)
      }
      _ => json!({ "parent": { "key": epic_key } }),
    }
  }
}

/// Map an error status onto the service error vocabulary.
fn classify(
  status: StatusCode,
  subject: &str,
  body: &str,
  retry_after: Option<u64>,
) -> ServiceError {
  match status {
    StatusCode::NOT_FOUND | StatusCode::FORBIDDEN => ServiceError::NotFound(subject.to_string()),
    StatusCode::UNAUTHORIZED => ServiceError::Unauthorized,
    StatusCode::TOO_MANY_REQUESTS => ServiceError::RateLimited { retry_after },
    s if s.is_server_error() => ServiceError::Server {
      status,
      message: ApiErrorBody::message(body),
    },
    _ => ServiceError::Api {
      status,
      message: ApiErrorBody::message(body),
    },
  }
}

async fn decode<T: DeserializeOwned>(response: Response, subject: &str) -> ServiceResult<T> {
  let bytes = response.bytes().await?;
  serde_json::from_slice(&bytes).map_err(|e| ServiceError::Decode {
    context: subject.to_string(),
    message: e.to_string(),
  })
}

#[async_trait]
impl IssueService for JiraClient {
  #[instrument(skip(self))]
  async fn get_issue(&self, key: &str) -> ServiceResult<IssueRecord> {
    let mut issue: ApiIssue = self.get_json(&format!("issue/{}", key), &[], key).await?;

    let complete = issue
      .fields
      .comment
      .as_ref()
      .is_some_and(|page| page.comments.len() as u64 >= page.total);
    if !complete {
      let comments = self.fetch_comments(key).await?;
      issue.fields.comment = Some(ApiCommentPage {
        start_at: 0,
        max_results: comments.len() as u64,
        total: comments.len() as u64,
        comments,
      });
    }

    Ok(issue.into_record(self.epic_link_field.as_deref()))
  }

  async fn peek_updated(&self, key: &str) -> ServiceResult<String> {
    let peek: ApiUpdatedOnly = self
      .get_json(
        &format!("issue/{}", key),
        &[("fields", "updated".to_string())],
        key,
      )
      .await?;

    peek.fields.updated.ok_or_else(|| ServiceError::Decode {
      context: peek.key,
      message: "missing updated field".into(),
    })
  }

  #[instrument(skip(self))]
  async fn search_issues(&self, jql: &str, limit: usize) -> ServiceResult<Vec<IssueSummary>> {
    let mut all_issues = Vec::new();
    let mut start_at = 0usize;

    loop {
      let page_size = PAGE_SIZE.min(limit.saturating_sub(all_issues.len()));
      if page_size == 0 {
        break;
      }

      let response: ApiSearchResponse = self
        .get_json(
          "search",
          &[
            ("jql", jql.to_string()),
            ("startAt", start_at.to_string()),
            ("maxResults", page_size.to_string()),
            ("fields", SEARCH_FIELDS.to_string()),
          ],
          "search",
        )
        .await?;

      let count = response.issues.len();
      all_issues.extend(response.issues.into_iter().map(ApiIssue::into_summary));

      if count == 0 || start_at + count >= response.total as usize {
        break;
      }
      start_at += count;
    }

    Ok(all_issues)
  }

  async fn epic_children(&self, epic_key: &str) -> ServiceResult<Vec<IssueRef>> {
    let jql = self.epic_children_jql(epic_key);
    let children = self.search_issues(&jql, usize::MAX).await?;
    Ok(children.into_iter().map(IssueRef::from).collect())
  }

  async fn add_comment(&self, key: &str, body: &str) -> ServiceResult<()> {
    self
      .send_json(
        Method::POST,
        &format!("issue/{}/comment", key),
        &json!({ "body": body }),
        key,
      )
      .await?;
    Ok(())
  }

  async fn update_fields(&self, key: &str, update: &FieldUpdate) -> ServiceResult<()> {
    let fields = match update {
      FieldUpdate::Summary(summary) => json!({ "summary": summary }),
      FieldUpdate::Description(description) => json!({ "description": description }),
      FieldUpdate::Parent(epic_key) => self.parent_field(epic_key),
    };
    self
      .send_json(
        Method::PUT,
        &format!("issue/{}", key),
        &json!({ "fields": fields }),
        key,
      )
      .await?;
    Ok(())
  }

  async fn delete_issue(&self, key: &str) -> ServiceResult<()> {
    let request = self
      .request(Method::DELETE, &format!("issue/{}", key))?
      .query(&[("deleteSubtasks", "true")]);
    self.send(request, key).await?;
    Ok(())
  }

  async fn create_issue(&self, issue: &NewIssue) -> ServiceResult<String> {
    let response = self
      .send_json(
        Method::POST,
        "issue",
        &self.new_issue_fields(issue),
        &issue.project,
      )
      .await?;
    let created: ApiCreatedIssue = decode(response, "created issue").await?;
    Ok(created.key)
  }

  async fn create_issue_link(
    &self,
    link_type: &str,
    inward_key: &str,
    outward_key: &str,
  ) -> ServiceResult<()> {
    let body = json!({
      "type": { "name": link_type },
      "inwardIssue": { "key": inward_key },
      "outwardIssue": { "key": outward_key },
    });
    self
      .send_json(Method::POST, "issueLink", &body, outward_key)
      .await?;
    Ok(())
  }

  async fn delete_issue_link(&self, link_id: &str) -> ServiceResult<()> {
    let subject = format!("link {}", link_id);
    let request = self.request(Method::DELETE, &format!("issueLink/{}", link_id))?;
    self.send(request, &subject).await?;
    Ok(())
  }

  async fn list_link_types(&self) -> ServiceResult<Vec<LinkType>> {
    let response: ApiLinkTypesResponse = self
      .get_json("issueLinkType", &[], "link types")
      .await?;
    Ok(
      response
        .issue_link_types
        .into_iter()
        .map(LinkType::from)
        .collect(),
    )
  }

  async fn list_transitions(&self, key: &str) -> ServiceResult<Vec<Transition>> {
    let response: ApiTransitionsResponse = self
      .get_json(&format!("issue/{}/transitions", key), &[], key)
      .await?;
    Ok(
      response
        .transitions
        .into_iter()
        .map(Transition::from)
        .collect(),
    )
  }

  async fn apply_transition(&self, key: &str, transition_id: &str) -> ServiceResult<()> {
    let body = json!({
      "transition": {
        "id": transition_id
      }
    });
    self
      .send_json(
        Method::POST,
        &format!("issue/{}/transitions", key),
        &body,
        key,
      )
      .await?;
    Ok(())
  }

  async fn assign_issue(&self, key: &str, account_id: Option<&str>) -> ServiceResult<()> {
    let body = match self.auth_type {
      AuthType::Onpremise => json!({ "name": account_id }),
      _ => json!({ "accountId": account_id }),
    };
    self
      .send_json(
        Method::PUT,
        &format!("issue/{}/assignee", key),
        &body,
        key,
      )
      .await?;
    Ok(())
  }

  async fn myself(&self) -> ServiceResult<UserRecord> {
    let user: ApiUser = self.get_json("myself", &[], "current user").await?;
    Ok(user.into_record(""))
  }

  async fn get_user(&self, account_id: &str) -> ServiceResult<UserRecord> {
    let param = match self.auth_type {
      AuthType::Onpremise => "username",
      _ => "accountId",
    };
    let user: ApiUser = self
      .get_json("user", &[(param, account_id.to_string())], account_id)
      .await?;
    Ok(user.into_record(account_id))
  }

  async fn favourite_filters(&self) -> ServiceResult<Vec<FavouriteFilter>> {
    let filters: Vec<ApiFilter> = self
      .get_json("filter/favourite", &[], "favourite filters")
      .await?;
    Ok(filters.into_iter().map(FavouriteFilter::from).collect())
  }

  async fn update_filter_jql(&self, filter_id: &str, jql: &str) -> ServiceResult<()> {
    let subject = format!("filter {}", filter_id);
    self
      .send_json(
        Method::PUT,
        &format!("filter/{}", filter_id),
        &json!({ "jql": jql }),
        &subject,
      )
      .await?;
    Ok(())
  }

  async fn delete_filter(&self, filter_id: &str) -> ServiceResult<()> {
    let subject = format!("filter {}", filter_id);
    let request = self.request(Method::DELETE, &format!("filter/{}", filter_id))?;
    self.send(request, &subject).await?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use wiremock::matchers::{basic_auth, bearer_token, body_json, method, path, query_param};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn config(url: &str, auth_type: AuthType) -> JiraConfig {
    JiraConfig {
      url: url.to_string(),
      email: Some("me@example.com".into()),
      token: "secret".into(),
      auth_type,
      epic_link_field: Some("customfield_10014".into()),
      epic_name_field: None,
      timeout_secs: 5,
    }
  }

  async fn cloud_client(server: &MockServer) -> JiraClient {
    JiraClient::new(&config(&server.uri(), AuthType::Cloud)).unwrap()
  }

  fn issue_json(key: &str, updated: &str) -> Value {
    json!({
      "key": key,
      "fields": {
        "summary": "Fix login",
        "status": { "id": "3", "name": "In Progress" },
        "issuetype": { "name": "Task" },
        "assignee": { "accountId": "abc", "displayName": "Ada Lovelace" },
        "created": "2024-01-01T10:00:00.000+0000",
        "updated": updated,
        "description": "Steps: [~accountid:abc]",
        "comment": {
          "comments": [{
            "id": "100",
            "author": { "accountId": "abc", "displayName": "Ada Lovelace" },
            "body": "First",
            "created": "2024-01-02T10:00:00.000+0000"
          }],
          "startAt": 0,
          "maxResults": 1,
          "total": 1
        },
        "customfield_10014": "PROJ-1"
      }
    })
  }

  #[tokio::test]
  async fn test_get_issue_normalizes_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/rest/api/2/issue/PROJ-7"))
      .and(basic_auth("me@example.com", "secret"))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(issue_json("PROJ-7", "2024-03-01T00:00:00.000+0000")),
      )
      .expect(1)
      .mount(&server)
      .await;

    let issue = cloud_client(&server).await.get_issue("PROJ-7").await.unwrap();
    assert_eq!(issue.key, "PROJ-7");
    assert_eq!(issue.status, "In Progress");
    assert_eq!(issue.updated, "2024-03-01T00:00:00.000+0000");
    assert_eq!(issue.comments.len(), 1);
    assert_eq!(issue.parent.map(|p| p.key), Some("PROJ-1".to_string()));
  }

  #[tokio::test]
  async fn test_get_issue_fetches_remaining_comments() {
    let server = MockServer::start().await;
    let mut body = issue_json("PROJ-7", "2024-03-01T00:00:00.000+0000");
    body["fields"]["comment"]["total"] = json!(2);

    Mock::given(method("GET"))
      .and(path("/rest/api/2/issue/PROJ-7"))
      .respond_with(ResponseTemplate::new(200).set_body_json(body))
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/rest/api/2/issue/PROJ-7/comment"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "comments": [
          { "id": "100", "body": "First", "created": "2024-01-02T10:00:00.000+0000" },
          { "id": "101", "body": "Second", "created": "2024-01-03T10:00:00.000+0000" }
        ],
        "startAt": 0,
        "maxResults": 50,
        "total": 2
      })))
      .expect(1)
      .mount(&server)
      .await;

    let issue = cloud_client(&server).await.get_issue("PROJ-7").await.unwrap();
    let bodies: Vec<_> = issue.comments.iter().map(|c| c.body.as_str()).collect();
    assert_eq!(bodies, vec!["First", "Second"]);
  }

  #[tokio::test]
  async fn test_peek_requests_only_updated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/rest/api/2/issue/PROJ-7"))
      .and(query_param("fields", "updated"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "key": "PROJ-7",
        "fields": { "updated": "2024-03-02T00:00:00.000+0000" }
      })))
      .expect(1)
      .mount(&server)
      .await;

    let updated = cloud_client(&server)
      .await
      .peek_updated("PROJ-7")
      .await
      .unwrap();
    assert_eq!(updated, "2024-03-02T00:00:00.000+0000");
  }

  #[tokio::test]
  async fn test_missing_and_forbidden_map_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(path("/rest/api/2/issue/PROJ-404"))
      .respond_with(ResponseTemplate::new(404))
      .mount(&server)
      .await;
    Mock::given(path("/rest/api/2/issue/PROJ-403"))
      .respond_with(ResponseTemplate::new(403))
      .mount(&server)
      .await;

    let client = cloud_client(&server).await;
    assert!(client.peek_updated("PROJ-404").await.unwrap_err().is_not_found());
    assert!(client.get_issue("PROJ-403").await.unwrap_err().is_not_found());
  }

  #[tokio::test]
  async fn test_rate_limit_reads_retry_after() {
    let server = MockServer::start().await;
    Mock::given(path("/rest/api/2/myself"))
      .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "30"))
      .mount(&server)
      .await;

    let err = cloud_client(&server).await.myself().await.unwrap_err();
    assert!(matches!(
      err,
      ServiceError::RateLimited {
        retry_after: Some(30)
      }
    ));
    assert!(err.is_transient());
  }

  #[tokio::test]
  async fn test_bad_jql_carries_jira_message() {
    let server = MockServer::start().await;
    Mock::given(path("/rest/api/2/search"))
      .respond_with(ResponseTemplate::new(400).set_body_json(json!({
        "errorMessages": ["Error in the JQL Query"],
        "errors": {}
      })))
      .mount(&server)
      .await;

    let err = cloud_client(&server)
      .await
      .search_issues("project = ", 10)
      .await
      .unwrap_err();
    match err {
      ServiceError::Api { status, message } => {
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message, "Error in the JQL Query");
      }
      other => panic!("unexpected error: {other:?}"),
    }
  }

  #[tokio::test]
  async fn test_search_paginates_until_total() {
    let server = MockServer::start().await;
    let page = |keys: &[&str], start: u64| {
      json!({
        "issues": keys.iter().map(|k| json!({
          "key": k,
          "fields": { "summary": k, "status": { "name": "Open" }, "issuetype": { "name": "Task" } }
        })).collect::<Vec<_>>(),
        "startAt": start,
        "maxResults": 2,
        "total": 3
      })
    };
    Mock::given(path("/rest/api/2/search"))
      .and(query_param("startAt", "0"))
      .respond_with(ResponseTemplate::new(200).set_body_json(page(&["P-1", "P-2"], 0)))
      .mount(&server)
      .await;
    Mock::given(path("/rest/api/2/search"))
      .and(query_param("startAt", "2"))
      .respond_with(ResponseTemplate::new(200).set_body_json(page(&["P-3"], 2)))
      .mount(&server)
      .await;

    let issues = cloud_client(&server)
      .await
      .search_issues("project = P", 100)
      .await
      .unwrap();
    let keys: Vec<_> = issues.iter().map(|i| i.key.as_str()).collect();
    assert_eq!(keys, vec!["P-1", "P-2", "P-3"]);
  }

  #[tokio::test]
  async fn test_unassign_sends_null_account() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
      .and(path("/rest/api/2/issue/PROJ-7/assignee"))
      .and(body_json(json!({ "accountId": null })))
      .respond_with(ResponseTemplate::new(204))
      .expect(1)
      .mount(&server)
      .await;

    cloud_client(&server)
      .await
      .assign_issue("PROJ-7", None)
      .await
      .unwrap();
  }

  #[tokio::test]
  async fn test_create_issue_returns_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/rest/api/2/issue"))
      .and(body_json(json!({
        "fields": {
          "project": { "key": "PROJ" },
          "summary": "Child",
          "issuetype": { "name": "Task" },
          "parent": { "key": "PROJ-1" }
        }
      })))
      .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "1", "key": "PROJ-9" })))
      .mount(&server)
      .await;

    let key = cloud_client(&server)
      .await
      .create_issue(&NewIssue {
        project: "PROJ".into(),
        summary: "Child".into(),
        issue_type: "Task".into(),
        parent: Some("PROJ-1".into()),
        description: None,
        priority: None,
        labels: Vec::new(),
      })
      .await
      .unwrap();
    assert_eq!(key, "PROJ-9");
  }

  #[tokio::test]
  async fn test_create_issue_sends_priority_and_labels() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/rest/api/2/issue"))
      .and(body_json(json!({
        "fields": {
          "project": { "key": "OPS" },
          "summary": "Copy",
          "issuetype": { "name": "Bug" },
          "description": "Steps",
          "priority": { "name": "High" },
          "labels": ["infra", "oncall"]
        }
      })))
      .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "2", "key": "OPS-4" })))
      .expect(1)
      .mount(&server)
      .await;

    let key = cloud_client(&server)
      .await
      .create_issue(&NewIssue {
        project: "OPS".into(),
        summary: "Copy".into(),
        issue_type: "Bug".into(),
        parent: None,
        description: Some("Steps".into()),
        priority: Some("High".into()),
        labels: vec!["infra".into(), "oncall".into()],
      })
      .await
      .unwrap();
    assert_eq!(key, "OPS-4");
  }

  #[tokio::test]
  async fn test_set_parent_uses_parent_on_cloud() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
      .and(path("/rest/api/2/issue/PROJ-7"))
      .and(body_json(json!({ "fields": { "parent": { "key": "PROJ-1" } } })))
      .respond_with(ResponseTemplate::new(204))
      .expect(1)
      .mount(&server)
      .await;

    cloud_client(&server)
      .await
      .update_fields("PROJ-7", &FieldUpdate::Parent("PROJ-1".into()))
      .await
      .unwrap();
  }

  #[tokio::test]
  async fn test_set_parent_uses_epic_link_field_onpremise() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
      .and(path("/rest/api/2/issue/PROJ-7"))
      .and(body_json(json!({ "fields": { "customfield_10014": "PROJ-1" } })))
      .respond_with(ResponseTemplate::new(204))
      .expect(1)
      .mount(&server)
      .await;

    JiraClient::new(&config(&server.uri(), AuthType::Onpremise))
      .unwrap()
      .update_fields("PROJ-7", &FieldUpdate::Parent("PROJ-1".into()))
      .await
      .unwrap();
  }

  #[tokio::test]
  async fn test_favourite_filters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/rest/api/2/filter/favourite"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([
        { "id": "10001", "name": "My bugs", "jql": "type = Bug", "owner": { "displayName": "Ada" } }
      ])))
      .mount(&server)
      .await;
    Mock::given(method("PUT"))
      .and(path("/rest/api/2/filter/10001"))
      .and(body_json(json!({ "jql": "type = Bug ORDER BY key" })))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "10001" })))
      .expect(1)
      .mount(&server)
      .await;
    Mock::given(method("DELETE"))
      .and(path("/rest/api/2/filter/10001"))
      .respond_with(ResponseTemplate::new(204))
      .expect(1)
      .mount(&server)
      .await;

    let client = cloud_client(&server).await;
    let filters = client.favourite_filters().await.unwrap();
    assert_eq!(filters.len(), 1);
    assert_eq!(filters[0].name, "My bugs");
    assert_eq!(filters[0].owner.as_deref(), Some("Ada"));
    client
      .update_filter_jql("10001", "type = Bug ORDER BY key")
      .await
      .unwrap();
    client.delete_filter("10001").await.unwrap();
  }

  #[tokio::test]
  async fn test_onpremise_uses_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(path("/rest/api/2/myself"))
      .and(bearer_token("secret"))
      .respond_with(
        ResponseTemplate::new(200).set_body_json(json!({ "name": "ada", "displayName": "Ada" })),
      )
      .expect(1)
      .mount(&server)
      .await;

    let client = JiraClient::new(&config(&server.uri(), AuthType::Onpremise)).unwrap();
    let me = client.myself().await.unwrap();
    assert_eq!(me.account_id, "ada");
    assert_eq!(me.display_name, "Ada");
  }

  #[test]
  fn test_epic_children_jql_includes_epic_link_field() {
    let client = JiraClient::new(&config("https://x.atlassian.net", AuthType::Auto)).unwrap();
    assert_eq!(
      client.epic_children_jql("PROJ-1"),
      "parent = PROJ-1 OR cf[10014] = PROJ-1 ORDER BY key ASC"
    );
  }

  #[test]
  fn test_browse_url() {
    let client = JiraClient::new(&config("https://x.atlassian.net/", AuthType::Auto)).unwrap();
    assert_eq!(
      client.browse_url("PROJ-1"),
      "https://x.atlassian.net/browse/PROJ-1"
    );
  }

  #[test]
  fn test_classify_statuses() {
    assert!(matches!(
      classify(StatusCode::UNAUTHORIZED, "x", "", None),
      ServiceError::Unauthorized
    ));
    assert!(classify(StatusCode::BAD_GATEWAY, "x", "oops", None).is_transient());
    assert!(!classify(StatusCode::CONFLICT, "x", "", None).is_transient());
  }
}
