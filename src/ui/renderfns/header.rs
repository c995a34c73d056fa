use ratatui::prelude::*;

use crate::jira::types::IssueRef;

/// Startup banner with instance and default project
pub fn banner(jira_url: &str, project: Option<&str>) -> Line<'static> {
  let domain = extract_domain(jira_url);

  Line::from(vec![
    Span::styled(" jirash ", Style::default().fg(Color::Cyan).bold()),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(format!(" {} ", domain), Style::default().fg(Color::White)),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(
      format!(" {} ", project.unwrap_or("-")),
      Style::default().fg(Color::Yellow).bold(),
    ),
    Span::raw("  "),
    // Shortcuts - keys highlighted, descriptions dimmed
    Span::styled("help", Style::default().fg(Color::Cyan)),
    Span::styled(" commands", Style::default().fg(Color::DarkGray)),
    Span::raw("   "),
    Span::styled("KEY", Style::default().fg(Color::Cyan)),
    Span::styled(" view", Style::default().fg(Color::DarkGray)),
    Span::raw("   "),
    Span::styled("q", Style::default().fg(Color::Cyan)),
    Span::styled(" quit", Style::default().fg(Color::DarkGray)),
  ])
}

/// Prompt text: `jirash> ` or `[PROJ-1: summary]> `
pub fn prompt(focused: Option<&IssueRef>, max_summary: usize) -> Line<'static> {
  match focused {
    None => Line::from(Span::styled("jirash> ", Style::default().fg(Color::Cyan))),
    Some(issue) => Line::from(vec![
      Span::styled("[", Style::default().fg(Color::DarkGray)),
      Span::styled(issue.key.clone(), Style::default().fg(Color::Cyan).bold()),
      Span::styled(
        format!(": {}", super::truncate(&issue.summary, max_summary)),
        Style::default().fg(Color::White),
      ),
      Span::styled("]> ", Style::default().fg(Color::DarkGray)),
    ]),
  }
}

/// Extract domain from Jira URL
fn extract_domain(url: &str) -> &str {
  url
    .strip_prefix("https://")
    .or_else(|| url.strip_prefix("http://"))
    .unwrap_or(url)
    .split('/')
    .next()
    .unwrap_or(url)
}
