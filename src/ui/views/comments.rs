use ratatui::prelude::*;

use super::heading;
use super::issue::comment_lines;
use crate::jira::types::IssueRecord;

pub fn comment_list(issue: &IssueRecord) -> Text<'static> {
  if issue.comments.is_empty() {
    return super::notice(format!("No comments on {}.", issue.key));
  }

  let mut lines = vec![heading(&format!(
    "Comments on {} ({})",
    issue.key,
    issue.comments.len()
  ))];
  for comment in &issue.comments {
    lines.extend(comment_lines(comment));
  }
  Text::from(lines)
}
