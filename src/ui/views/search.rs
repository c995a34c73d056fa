use ratatui::prelude::*;

use crate::jira::types::IssueSummary;
use crate::ui::renderfns::{status_color, truncate, user_color};

const TYPE_WIDTH: usize = 10;
const STATUS_WIDTH: usize = 14;
const ASSIGNEE_WIDTH: usize = 18;

/// Result table: key, type, status, assignee, summary
pub fn issue_table(title: &str, issues: &[IssueSummary], width: usize) -> Text<'static> {
  if issues.is_empty() {
    return super::notice("No issues found.");
  }

  let key_width = issues.iter().map(|i| i.key.len()).max().unwrap_or(0).max(3);
  let fixed = key_width + TYPE_WIDTH + STATUS_WIDTH + ASSIGNEE_WIDTH + 4;
  let summary_width = width.saturating_sub(fixed).max(10);

  let dim = Style::default().fg(Color::DarkGray);
  let mut lines = vec![
    Line::from(Span::styled(
      format!("{} ({})", title, issues.len()),
      Style::default().fg(Color::Cyan).bold(),
    )),
    Line::from(Span::styled(
      format!(
        "{:<kw$} {:<tw$} {:<sw$} {:<aw$} {}",
        "KEY",
        "TYPE",
        "STATUS",
        "ASSIGNEE",
        "SUMMARY",
        kw = key_width,
        tw = TYPE_WIDTH,
        sw = STATUS_WIDTH,
        aw = ASSIGNEE_WIDTH,
      ),
      dim.bold(),
    )),
  ];

  for issue in issues {
    let assignee = issue.assignee.as_deref().unwrap_or("Unassigned");
    let assignee_style = match &issue.assignee {
      Some(name) => Style::default().fg(user_color(name)),
      None => dim,
    };

    lines.push(Line::from(vec![
      Span::styled(
        format!("{:<w$} ", issue.key, w = key_width),
        Style::default().fg(Color::Cyan),
      ),
      Span::styled(
        format!("{:<w$} ", truncate(&issue.issue_type, TYPE_WIDTH), w = TYPE_WIDTH),
        Style::default().fg(Color::Magenta),
      ),
      Span::styled(
        format!("{:<w$} ", truncate(&issue.status, STATUS_WIDTH), w = STATUS_WIDTH),
        Style::default().fg(status_color(&issue.status)),
      ),
      Span::styled(
        format!("{:<w$} ", truncate(assignee, ASSIGNEE_WIDTH), w = ASSIGNEE_WIDTH),
        assignee_style,
      ),
      Span::raw(truncate(&issue.summary, summary_width)),
    ]));
  }

  Text::from(lines)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ui::views::plain;

  fn summary(key: &str, text: &str, assignee: Option<&str>) -> IssueSummary {
    IssueSummary {
      key: key.into(),
      summary: text.into(),
      status: "To Do".into(),
      issue_type: "Task".into(),
      assignee: assignee.map(String::from),
      priority: None,
      updated: String::new(),
    }
  }

  #[test]
  fn test_table_columns_align() {
    let issues = vec![
      summary("PROJ-1", "Short", Some("Ada")),
      summary("PROJ-100", "Also short", None),
    ];
    let text = plain(&issue_table("Results", &issues, 120));
    let rows: Vec<&str> = text.lines().collect();
    assert_eq!(rows[0], "Results (2)");
    assert!(rows[1].starts_with("KEY      TYPE"));
    assert!(rows[2].starts_with("PROJ-1   Task"));
    assert!(rows[3].contains("Unassigned"));
  }

  #[test]
  fn test_long_summary_is_truncated() {
    let long = "x".repeat(200);
    let text = plain(&issue_table("Results", &[summary("P-1", &long, None)], 80));
    assert!(text.lines().last().unwrap().ends_with("..."));
    assert!(text.lines().last().unwrap().chars().count() <= 80);
  }

  #[test]
  fn test_empty_result() {
    assert_eq!(plain(&issue_table("Results", &[], 80)), "No issues found.");
  }
}
