use ratatui::prelude::*;

use crate::jira::types::AttachmentRecord;
use crate::ui::renderfns::{format_timestamp, truncate, user_color};

const NAME_WIDTH: usize = 40;

pub fn attachment_list(key: &str, attachments: &[AttachmentRecord]) -> Text<'static> {
  if attachments.is_empty() {
    return super::notice(format!("No attachments on {}.", key));
  }

  let mut lines = vec![
    super::heading(&format!("Attachments on {} ({})", key, attachments.len())),
    Line::from(Span::styled(
      format!(
        "{:<nw$} {:>10}  {:<16}  {}",
        "FILENAME",
        "SIZE",
        "CREATED",
        "AUTHOR",
        nw = NAME_WIDTH
      ),
      Style::default().fg(Color::DarkGray).bold(),
    )),
  ];

  for attachment in attachments {
    let author = match &attachment.author {
      Some(user) => Span::styled(
        user.display_name.clone(),
        Style::default().fg(user_color(&user.display_name)),
      ),
      None => Span::styled("Unknown", Style::default().fg(Color::DarkGray)),
    };
    lines.push(Line::from(vec![
      Span::styled(
        format!(
          "{:<w$} ",
          truncate(&attachment.filename, NAME_WIDTH),
          w = NAME_WIDTH
        ),
        Style::default().fg(Color::Cyan),
      ),
      Span::raw(format!("{:>10}  ", human_size(attachment.size))),
      Span::raw(format!("{:<16}  ", format_timestamp(&attachment.created))),
      author,
    ]));
  }

  Text::from(lines)
}

fn human_size(bytes: u64) -> String {
  match bytes {
    b if b < 1024 => format!("{} B", b),
    b if b < 1024 * 1024 => format!("{:.2} KB", b as f64 / 1024.0),
    b => format!("{:.2} MB", b as f64 / (1024.0 * 1024.0)),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::jira::types::UserRef;
  use crate::ui::views::plain;

  #[test]
  fn test_lists_attachments() {
    let attachments = vec![AttachmentRecord {
      id: "10".into(),
      filename: "screenshot.png".into(),
      size: 2048,
      mime_type: Some("image/png".into()),
      author: Some(UserRef {
        account_id: None,
        display_name: "Ada".into(),
      }),
      created: "2024-02-03T04:05:00.000+0000".into(),
    }];
    let text = plain(&attachment_list("PROJ-1", &attachments));
    let rows: Vec<&str> = text.lines().collect();
    assert_eq!(rows[0], "Attachments on PROJ-1 (1)");
    assert!(rows[2].starts_with("screenshot.png"));
    assert!(rows[2].contains("2.00 KB"));
    assert!(rows[2].contains("2024-02-03 04:05"));
    assert!(rows[2].ends_with("Ada"));
  }

  #[test]
  fn test_no_attachments() {
    assert_eq!(
      plain(&attachment_list("PROJ-1", &[])),
      "No attachments on PROJ-1."
    );
  }

  #[test]
  fn test_human_size() {
    assert_eq!(human_size(512), "512 B");
    assert_eq!(human_size(1536), "1.50 KB");
    assert_eq!(human_size(3 * 1024 * 1024), "3.00 MB");
  }
}
