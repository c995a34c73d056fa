//! Terminal output.
//!
//! Views build `ratatui` [`Text`] values; this module writes them to stdout with
//! crossterm styling. Keeping the two apart makes every view a pure function.

pub mod renderfns;
pub mod views;

use std::io::{self, IsTerminal, Write};

use crossterm::style::{Attribute, Print, ResetColor, SetAttribute, SetForegroundColor};
use crossterm::queue;
use ratatui::style::{Color, Modifier};
use ratatui::text::{Line, Text};

/// Print `text` followed by a newline.
pub fn print(text: &Text) -> io::Result<()> {
  let stdout = io::stdout();
  let styled = stdout.is_terminal();
  let mut out = stdout.lock();
  write_text(&mut out, text, styled)?;
  out.flush()
}

/// Print a single line without the trailing newline (prompts).
pub fn print_inline(line: &Line) -> io::Result<()> {
  let stdout = io::stdout();
  let styled = stdout.is_terminal();
  let mut out = stdout.lock();
  write_line(&mut out, line, styled)?;
  out.flush()
}

pub fn write_text<W: Write>(out: &mut W, text: &Text, styled: bool) -> io::Result<()> {
  for line in &text.lines {
    write_line(out, line, styled)?;
    queue!(out, Print("\n"))?;
  }
  Ok(())
}

fn write_line<W: Write>(out: &mut W, line: &Line, styled: bool) -> io::Result<()> {
  for span in &line.spans {
    if !styled {
      queue!(out, Print(&span.content))?;
      continue;
    }

    let style = line.style.patch(span.style);
    if let Some(fg) = style.fg {
      queue!(out, SetForegroundColor(to_crossterm_color(fg)))?;
    }
    if style.add_modifier.contains(Modifier::BOLD) {
      queue!(out, SetAttribute(Attribute::Bold))?;
    }
    if style.add_modifier.contains(Modifier::DIM) {
      queue!(out, SetAttribute(Attribute::Dim))?;
    }
    if style.add_modifier.contains(Modifier::ITALIC) {
      queue!(out, SetAttribute(Attribute::Italic))?;
    }
    queue!(
      out,
      Print(&span.content),
      SetAttribute(Attribute::Reset),
      ResetColor
    )?;
  }
  Ok(())
}

/// Same mapping ratatui's crossterm backend uses: the plain names are the dark variants.
pub fn to_crossterm_color(color: Color) -> crossterm::style::Color {
  use crossterm::style::Color as C;
  match color {
    Color::Reset => C::Reset,
    Color::Black => C::Black,
    Color::Red => C::DarkRed,
    Color::Green => C::DarkGreen,
    Color::Yellow => C::DarkYellow,
    Color::Blue => C::DarkBlue,
    Color::Magenta => C::DarkMagenta,
    Color::Cyan => C::DarkCyan,
    Color::Gray => C::Grey,
    Color::DarkGray => C::DarkGrey,
    Color::LightRed => C::Red,
    Color::LightGreen => C::Green,
    Color::LightYellow => C::Yellow,
    Color::LightBlue => C::Blue,
    Color::LightMagenta => C::Magenta,
    Color::LightCyan => C::Cyan,
    Color::White => C::White,
    Color::Rgb(r, g, b) => C::Rgb { r, g, b },
    Color::Indexed(i) => C::AnsiValue(i),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use ratatui::style::{Style, Stylize};
  use ratatui::text::Span;

  fn sample() -> Text<'static> {
    Text::from(vec![
      Line::from(vec![
        Span::styled("PROJ-1", Style::default().fg(Color::Cyan).bold()),
        Span::raw(": Fix login"),
      ]),
      Line::from("second"),
    ])
  }

  #[test]
  fn test_plain_output_has_no_escapes() {
    let mut out = Vec::new();
    write_text(&mut out, &sample(), false).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "PROJ-1: Fix login\nsecond\n");
  }

  #[test]
  fn test_styled_output_contains_text_and_escapes() {
    let mut out = Vec::new();
    write_text(&mut out, &sample(), true).unwrap();
    let out = String::from_utf8(out).unwrap();
    assert!(out.contains('\u{1b}'));
    assert!(out.contains("PROJ-1"));
    assert!(out.contains("second"));
  }

  #[test]
  fn test_color_mapping() {
    use crossterm::style::Color as C;
    assert_eq!(to_crossterm_color(Color::Red), C::DarkRed);
    assert_eq!(to_crossterm_color(Color::LightRed), C::Red);
    assert_eq!(
      to_crossterm_color(Color::Rgb(1, 2, 3)),
      C::Rgb { r: 1, g: 2, b: 3 }
    );
  }
}
