use ratatui::prelude::*;

use crate::jira::types::Transition;
use crate::ui::renderfns::status_color;

pub fn transition_list(key: &str, current: &str, transitions: &[Transition]) -> Text<'static> {
  if transitions.is_empty() {
    return super::notice(format!("No transitions available for {}.", key));
  }

  let mut lines = vec![Line::from(vec![
    Span::styled(
      format!("{} is ", key),
      Style::default().fg(Color::Cyan).bold(),
    ),
    Span::styled(
      current.to_string(),
      Style::default().fg(status_color(current)).bold(),
    ),
    Span::styled(
      ". Available transitions:",
      Style::default().fg(Color::Cyan).bold(),
    ),
  ])];

  for transition in transitions {
    lines.push(Line::from(vec![
      Span::raw(format!("  {}", transition.name)),
      Span::styled(" → ", Style::default().fg(Color::DarkGray)),
      Span::styled(
        transition.to_status.clone(),
        Style::default().fg(status_color(&transition.to_status)),
      ),
    ]));
  }

  Text::from(lines)
}
