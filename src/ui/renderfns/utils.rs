use chrono::DateTime;
use ratatui::prelude::Color;
use sha2::{Digest, Sha256};

/// Truncate a string to a maximum length in characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Get the display color for a Jira issue status
pub fn status_color(status: &str) -> Color {
  match status.to_lowercase().as_str() {
    "done" | "closed" | "resolved" => Color::Green,
    "in progress" | "in review" => Color::Yellow,
    "blocked" => Color::Red,
    "to do" | "backlog" => Color::Blue,
    _ => Color::White,
  }
}

/// Stable per-person color derived from the display name
pub fn user_color(name: &str) -> Color {
  let digest = hex::encode(Sha256::digest(name.as_bytes()));
  let channel = |i: usize| {
    let raw = u8::from_str_radix(&digest[i..i + 2], 16).unwrap_or(0);
    // Keep names readable on dark backgrounds
    96 + raw % 160
  };
  Color::Rgb(channel(0), channel(2), channel(4))
}

/// `YYYY-MM-DD HH:MM` for Jira timestamps; unparseable input is returned as-is.
pub fn format_timestamp(ts: &str) -> String {
  DateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f%z")
    .or_else(|_| DateTime::parse_from_rfc3339(ts))
    .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
    .unwrap_or_else(|_| ts.to_string())
}
