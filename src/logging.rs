use std::path::{Path, PathBuf};

use color_eyre::{eyre::eyre, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_ENV: &str = "JIRASH_LOG";
const DEFAULT_LEVEL: &str = "warn";
const LOG_FILE: &str = "jirash.log";

/// Default log directory: `$XDG_DATA_HOME/jirash`
pub fn default_log_dir() -> Option<PathBuf> {
  dirs::data_dir().map(|dir| dir.join("jirash"))
}

/// Route tracing output to a file; stdout belongs to the shell.
///
/// The returned guard flushes pending lines on drop and must outlive the program.
pub fn init(dir: &Path) -> Result<WorkerGuard> {
  std::fs::create_dir_all(dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", dir.display(), e))?;

  let appender = tracing_appender::rolling::never(dir, LOG_FILE);
  let (writer, guard) = tracing_appender::non_blocking(appender);

  let env_filter =
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL));

  let fmt_layer = fmt::layer()
    .with_writer(writer)
    .with_ansi(false)
    .with_target(true);

  tracing_subscriber::registry()
    .with(env_filter)
    .with(fmt_layer)
    .try_init()
    .map_err(|e| eyre!("Failed to initialize logging: {}", e))?;

  Ok(guard)
}
