use std::io::Write;
use std::process::Command;

use color_eyre::{eyre::eyre, Result};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

const FALLBACK_EDITOR: &str = "vi";
/// Exit status `sh` uses for "command not found"
const NOT_FOUND: i32 = 127;

/// External editor for long text (comments, descriptions).
#[derive(Debug, Clone)]
pub struct Editor {
  command: String,
  fallback: String,
}

impl Editor {
  /// `$EDITOR`, falling back to vi.
  pub fn from_env() -> Self {
    let command = std::env::var("EDITOR")
      .ok()
      .filter(|e| !e.trim().is_empty())
      .unwrap_or_else(|| FALLBACK_EDITOR.to_string());
    Self::new(command, FALLBACK_EDITOR)
  }

  pub fn new(command: impl Into<String>, fallback: impl Into<String>) -> Self {
    Self {
      command: command.into(),
      fallback: fallback.into(),
    }
  }

  /// Let the user edit `initial`. Returns `None` when the result is empty or
  /// unchanged. The temp file is removed on every path.
  pub fn edit(&self, initial: &str) -> Result<Option<String>> {
    let mut file = tempfile::Builder::new()
      .prefix("jirash-")
      .suffix(".txt")
      .tempfile()?;
    file.write_all(initial.as_bytes())?;
    file.flush()?;

    if !self.run(&self.command, &file)? {
      warn!(editor = %self.command, fallback = %self.fallback, "editor not found");
      if !self.run(&self.fallback, &file)? {
        return Err(eyre!("No usable editor (tried '{}' and '{}')", self.command, self.fallback));
      }
    }

    let edited = std::fs::read_to_string(file.path())?;
    let edited = edited.trim();
    if edited.is_empty() || edited == initial.trim() {
      debug!("edit aborted");
      return Ok(None);
    }
    Ok(Some(edited.to_string()))
  }

  /// Returns false when the editor could not be launched.
  fn run(&self, editor: &str, file: &NamedTempFile) -> Result<bool> {
    let status = match Command::new("sh")
      .arg("-c")
      .arg(format!("{editor} \"$1\""))
      .arg("--")
      .arg(file.path())
      .status()
    {
      Ok(status) => status,
      Err(e) => {
        debug!(error = %e, "failed to spawn shell");
        return Ok(false);
      }
    };

    match status.code() {
      Some(NOT_FOUND) => Ok(false),
      Some(0) => Ok(true),
      code => Err(eyre!("Editor exited with status {}", code.unwrap_or(-1))),
    }
  }
}
