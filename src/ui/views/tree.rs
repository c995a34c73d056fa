use ratatui::prelude::*;

use crate::jira::types::{IssueRecord, IssueRef};
use crate::ui::renderfns::status_color;

/// Parent (if any), the issue itself, then its subtasks and epic children.
pub fn issue_tree(issue: &IssueRecord) -> Text<'static> {
  let mut lines = Vec::new();
  let (prefix, child_indent) = match &issue.parent {
    Some(parent) => {
      lines.push(node(parent, "", false));
      ("└── ", "    ")
    }
    None => ("", ""),
  };
  lines.push(node(&issue.to_ref(), prefix, true));

  let children: Vec<&IssueRef> = issue.subtasks.iter().chain(&issue.children).collect();
  for (i, child) in children.iter().enumerate() {
    let branch = if i + 1 == children.len() {
      "└── "
    } else {
      "├── "
    };
    lines.push(node(child, &format!("{}{}", child_indent, branch), false));
  }

  Text::from(lines)
}

fn node(issue: &IssueRef, prefix: &str, focused: bool) -> Line<'static> {
  let key_style = if focused {
    Style::default().fg(Color::Cyan).bold()
  } else {
    Style::default().fg(Color::Cyan)
  };

  let mut spans = vec![
    Span::styled(prefix.to_string(), Style::default().fg(Color::DarkGray)),
    Span::styled(issue.key.clone(), key_style),
  ];
  if let Some(status) = &issue.status {
    spans.push(Span::styled(
      format!(" [{}]", status),
      Style::default().fg(status_color(status)),
    ));
  }
  spans.push(Span::raw(format!(" {}", issue.summary)));
  Line::from(spans)
}
