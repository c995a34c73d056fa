pub mod attachments;
pub mod comments;
pub mod filters;
pub mod help;
pub mod issue;
pub mod search;
pub mod transitions;
pub mod tree;

use ratatui::prelude::*;

pub use attachments::attachment_list;
pub use comments::comment_list;
pub use filters::filter_table;
pub use help::help_table;
pub use issue::issue_panel;
pub use search::issue_table;
pub use transitions::transition_list;
pub use tree::issue_tree;

fn label(name: &str) -> Span<'static> {
  Span::styled(format!("{}: ", name), Style::default().fg(Color::Blue))
}

fn heading(title: &str) -> Line<'static> {
  Line::from(Span::styled(
    title.to_string(),
    Style::default().fg(Color::Cyan).bold(),
  ))
}

pub fn notice(message: impl Into<String>) -> Text<'static> {
  Text::from(Line::from(Span::styled(
    message.into(),
    Style::default().fg(Color::Yellow),
  )))
}

pub fn success(message: impl Into<String>) -> Text<'static> {
  Text::from(Line::from(Span::styled(
    message.into(),
    Style::default().fg(Color::Green),
  )))
}

pub fn error(message: impl Into<String>) -> Text<'static> {
  Text::from(Line::from(vec![
    Span::styled("Error: ", Style::default().fg(Color::Red).bold()),
    Span::raw(message.into()),
  ]))
}

/// Plain text of a rendered view, for assertions
#[cfg(test)]
pub(crate) fn plain(text: &Text) -> String {
  text
    .lines
    .iter()
    .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect::<String>())
    .collect::<Vec<_>>()
    .join("\n")
}
