use ratatui::prelude::*;

use super::{heading, label};
use crate::jira::types::{CommentRecord, IssueRecord, IssueRef, UserRef};
use crate::ui::renderfns::{format_timestamp, status_color, truncate, user_color};

/// Comments shown under the issue; `comments` shows the rest
const RECENT_COMMENTS: usize = 3;

/// Full issue panel. Mentions are expected to be resolved already.
pub fn issue_panel(issue: &IssueRecord, offline: bool, width: usize) -> Text<'static> {
  let mut lines = Vec::new();

  let mut title = vec![
    Span::styled(format!("{}: ", issue.key), Style::default().fg(Color::Cyan).bold()),
    Span::styled(issue.summary.clone(), Style::default().fg(Color::White).bold()),
  ];
  if offline {
    title.push(Span::styled(
      "  (offline)",
      Style::default().fg(Color::DarkGray),
    ));
  }
  lines.push(Line::from(title));
  lines.push(separator(width));

  lines.push(Line::from(vec![
    label("Status"),
    Span::styled(
      issue.status.clone(),
      Style::default().fg(status_color(&issue.status)).bold(),
    ),
  ]));
  lines.push(Line::from(vec![
    label("Type"),
    Span::styled(issue.issue_type.clone(), Style::default().fg(Color::Magenta)),
  ]));
  lines.push(Line::from(vec![
    label("Priority"),
    Span::styled(
      issue.priority.clone().unwrap_or_else(|| "None".into()),
      Style::default().fg(Color::Yellow),
    ),
  ]));
  lines.push(Line::from(vec![
    label("Assignee"),
    person(issue.assignee.as_ref(), "Unassigned"),
  ]));
  lines.push(Line::from(vec![
    label("Reporter"),
    person(issue.reporter.as_ref(), "Unknown"),
  ]));
  lines.push(Line::from(vec![
    label("Created"),
    Span::raw(format_timestamp(&issue.created)),
    Span::raw("   "),
    label("Updated"),
    Span::raw(format_timestamp(&issue.updated)),
  ]));
  if !issue.labels.is_empty() {
    lines.push(Line::from(vec![
      label("Labels"),
      Span::styled(issue.labels.join(", "), Style::default().fg(Color::LightBlue)),
    ]));
  }
  if let Some(parent) = &issue.parent {
    lines.push(Line::from(vec![label("Parent"), issue_ref(parent, width)]));
  }
  if !issue.attachments.is_empty() {
    lines.push(Line::from(vec![
      label("Attachments"),
      Span::raw(issue.attachments.len().to_string()),
      Span::styled(" (`attachments` to list)", Style::default().fg(Color::DarkGray)),
    ]));
  }

  lines.push(Line::default());
  lines.push(Line::from(Span::styled(
    "Description:",
    Style::default().fg(Color::Blue).bold(),
  )));
  match issue.description.as_deref().map(str::trim) {
    Some(description) if !description.is_empty() => {
      lines.extend(description.lines().map(|l| Line::from(l.to_string())));
    }
    _ => lines.push(Line::from(Span::styled(
      "No description provided.",
      Style::default().fg(Color::DarkGray),
    ))),
  }

  section(&mut lines, "Sub-tasks", &issue.subtasks, width);
  section(&mut lines, "Child issues", &issue.children, width);

  if !issue.links.is_empty() {
    lines.push(Line::default());
    lines.push(heading("Linked issues"));
    for link in &issue.links {
      lines.push(Line::from(vec![
        Span::styled(
          format!("  {}: ", link.relation),
          Style::default().fg(Color::DarkGray),
        ),
        issue_ref(&link.issue, width),
      ]));
    }
  }

  if !issue.comments.is_empty() {
    lines.push(Line::default());
    lines.push(heading("Comments"));
    let skipped = issue.comments.len().saturating_sub(RECENT_COMMENTS);
    if skipped > 0 {
      lines.push(Line::from(Span::styled(
        format!("  … {} earlier comment(s), use `comments` to show all", skipped),
        Style::default().fg(Color::DarkGray),
      )));
    }
    for comment in &issue.comments[skipped..] {
      lines.extend(comment_lines(comment));
    }
  }

  Text::from(lines)
}

pub(super) fn comment_lines(comment: &CommentRecord) -> Vec<Line<'static>> {
  let mut lines = vec![Line::from(vec![
    Span::raw("  "),
    person(comment.author.as_ref(), "Unknown"),
    Span::styled(
      format!(" ({})", format_timestamp(&comment.created)),
      Style::default().fg(Color::DarkGray),
    ),
  ])];
  lines.extend(
    comment
      .body
      .trim()
      .lines()
      .map(|l| Line::from(format!("    {}", l))),
  );
  lines
}

fn person(user: Option<&UserRef>, missing: &str) -> Span<'static> {
  match user {
    Some(user) => Span::styled(
      user.display_name.clone(),
      Style::default().fg(user_color(&user.display_name)),
    ),
    None => Span::styled(missing.to_string(), Style::default().fg(Color::DarkGray)),
  }
}

fn issue_ref(issue: &IssueRef, width: usize) -> Span<'static> {
  let text = match &issue.status {
    Some(status) => format!("{} [{}] {}", issue.key, status, issue.summary),
    None => format!("{} {}", issue.key, issue.summary),
  };
  Span::raw(truncate(text.trim_end(), width.saturating_sub(20)))
}

fn section(lines: &mut Vec<Line<'static>>, title: &str, items: &[IssueRef], width: usize) {
  if items.is_empty() {
    return;
  }
  lines.push(Line::default());
  lines.push(heading(title));
  for item in items {
    lines.push(Line::from(vec![Span::raw("  "), issue_ref(item, width)]));
  }
}

fn separator(width: usize) -> Line<'static> {
  Line::from(Span::styled(
    "─".repeat(width.min(80)),
    Style::default().fg(Color::DarkGray),
  ))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::jira::types::{AttachmentRecord, IssueLink, LinkDirection};
  use crate::ui::views::plain;

  fn record() -> IssueRecord {
    IssueRecord {
      key: "PROJ-7".into(),
      summary: "Fix login".into(),
      status: "In Progress".into(),
      status_id: "3".into(),
      issue_type: "Task".into(),
      priority: Some("High".into()),
      assignee: Some(UserRef {
        account_id: Some("abc".into()),
        display_name: "Ada Lovelace".into(),
      }),
      reporter: None,
      created: "2024-01-01T10:00:00.000+0000".into(),
      updated: "2024-03-01T09:05:00.000+0000".into(),
      description: Some("Line one\nLine two".into()),
      labels: vec!["auth".into()],
      comments: (1..=5)
        .map(|i| CommentRecord {
          id: i.to_string(),
          author: None,
          created: "2024-01-02T10:00:00.000+0000".into(),
          body: format!("comment {}", i),
        })
        .collect(),
      links: vec![IssueLink {
        id: "9".into(),
        link_type: "Blocks".into(),
        direction: LinkDirection::Inward,
        relation: "is blocked by".into(),
        issue: IssueRef {
          key: "PROJ-3".into(),
          summary: "Session store".into(),
          status: Some("Open".into()),
          issue_type: None,
        },
      }],
      attachments: Vec::new(),
      parent: None,
      subtasks: Vec::new(),
      children: Vec::new(),
    }
  }

  #[test]
  fn test_panel_lists_core_fields() {
    let text = plain(&issue_panel(&record(), false, 100));
    assert!(text.starts_with("PROJ-7: Fix login"));
    assert!(text.contains("Status: In Progress"));
    assert!(text.contains("Assignee: Ada Lovelace"));
    assert!(text.contains("Reporter: Unknown"));
    assert!(text.contains("Updated: 2024-03-01 09:05"));
    assert!(text.contains("Line two"));
    assert!(text.contains("is blocked by: PROJ-3 [Open] Session store"));
    assert!(!text.contains("(offline)"));
  }

  #[test]
  fn test_panel_shows_only_recent_comments() {
    let text = plain(&issue_panel(&record(), false, 100));
    assert!(text.contains("2 earlier comment(s)"));
    assert!(!text.contains("comment 2"));
    assert!(text.contains("comment 3"));
    assert!(text.contains("comment 5"));
  }

  #[test]
  fn test_offline_marker() {
    let text = plain(&issue_panel(&record(), true, 100));
    assert!(text.lines().next().unwrap().ends_with("(offline)"));
  }

  #[test]
  fn test_attachment_count() {
    let mut issue = record();
    assert!(!plain(&issue_panel(&issue, false, 100)).contains("Attachments"));
    issue.attachments.push(AttachmentRecord {
      id: "1".into(),
      filename: "trace.log".into(),
      size: 10,
      mime_type: None,
      author: None,
      created: String::new(),
    });
    assert!(plain(&issue_panel(&issue, false, 100)).contains("Attachments: 1"));
  }

  #[test]
  fn test_missing_description() {
    let mut issue = record();
    issue.description = None;
    let text = plain(&issue_panel(&issue, false, 100));
    assert!(text.contains("No description provided."));
  }
}
