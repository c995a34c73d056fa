use ratatui::prelude::*;

/// Saved filters as `name  jql` rows, sorted by name.
pub fn filter_table<'a>(
  title: &str,
  filters: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Text<'static> {
  let mut rows: Vec<(&str, &str)> = filters.into_iter().collect();
  if rows.is_empty() {
    return super::notice("No saved filters found.");
  }
  rows.sort_by_key(|(name, _)| name.to_lowercase());

  let name_width = rows
    .iter()
    .map(|(name, _)| name.chars().count())
    .max()
    .unwrap_or(0);
  let mut lines = vec![super::heading(title)];
  for (name, jql) in rows {
    lines.push(Line::from(vec![
      Span::styled(
        format!("  {:<w$}  ", name, w = name_width),
        Style::default().fg(Color::Magenta),
      ),
      Span::styled(jql.to_string(), Style::default().fg(Color::Green)),
    ]));
  }
  Text::from(lines)
}
