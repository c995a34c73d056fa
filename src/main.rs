mod app;
mod cache;
mod commands;
mod config;
mod editor;
mod error;
mod filters;
mod jira;
mod logging;
mod ui;

use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;

use crate::cache::{CacheStorage, SqliteStorage};

#[derive(Parser, Debug)]
#[command(name = "jirash")]
#[command(about = "An interactive Jira shell with a local issue cache")]
#[command(version)]
struct Args {
  /// Path to config file (default: ./jirash.yaml or $XDG_CONFIG_HOME/jirash/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Default project for new epics
  #[arg(short, long)]
  project: Option<String>,

  /// Keep the cache in memory for this session only
  #[arg(long)]
  no_cache: bool,

  /// Empty the on-disk cache before starting
  #[arg(long)]
  clear_cache: bool,

  /// First line to run: an issue key to view, or text to search for
  #[arg(trailing_var_arg = true)]
  input: Vec<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Held for the whole run so buffered log lines are flushed on exit
  let _log_guard = match logging::default_log_dir() {
    Some(dir) => match logging::init(&dir) {
      Ok(guard) => Some(guard),
      Err(e) => {
        eprintln!("jirash: logging disabled: {}", e);
        None
      }
    },
    None => None,
  };

  let config = config::Config::load(args.config.as_deref())?;

  // Override project if specified on command line
  let config = if let Some(project) = args.project {
    config::Config {
      default_project: Some(project.trim().to_uppercase()),
      ..config
    }
  } else {
    config
  };

  if args.clear_cache {
    let removed = SqliteStorage::open(&config.cache.dir)
      .and_then(|storage| storage.clear())
      .map_err(|e| eyre!("Failed to clear cache: {}", e))?;
    tracing::info!(removed, "cleared on-disk cache");
  }

  let initial = Some(args.input.join(" ")).filter(|line| !line.trim().is_empty());

  let mut app = app::App::new(config, !args.no_cache)?;
  app.run(initial).await?;

  Ok(())
}
