use ratatui::prelude::*;

use crate::commands::{Command, COMMANDS};

const USAGE_WIDTH: usize = 38;

/// Command reference plus the non-command input forms
pub fn help_table() -> Text<'static> {
  let mut lines = vec![super::heading("Commands")];
  lines.extend(COMMANDS.iter().map(command_line));

  lines.push(Line::default());
  lines.push(super::heading("Other input"));
  for (form, meaning) in [
    ("PROJ-123", "view and focus an issue"),
    ("jql: <query>", "run a raw JQL search"),
    ("<anything else>", "full-text search"),
  ] {
    lines.push(Line::from(vec![
      Span::styled(
        format!("  {:<w$}", form, w = USAGE_WIDTH),
        Style::default().fg(Color::Cyan),
      ),
      Span::raw(meaning),
    ]));
  }

  Text::from(lines)
}

fn command_line(cmd: &Command) -> Line<'static> {
  let usage = format!("{} {}", cmd.name, cmd.usage);
  Line::from(vec![
    Span::styled(
      format!("  {:<w$}", usage.trim_end(), w = USAGE_WIDTH),
      Style::default().fg(Color::Cyan),
    ),
    Span::styled(
      format!("{:<14}", cmd.aliases.join(", ")),
      Style::default().fg(Color::DarkGray),
    ),
    Span::raw(cmd.description),
  ])
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ui::views::plain;

  #[test]
  fn test_every_command_is_listed() {
    let text = plain(&help_table());
    for cmd in COMMANDS {
      assert!(text.contains(cmd.description), "missing {}", cmd.name);
    }
    assert!(text.contains("jql: <query>"));
  }
}
