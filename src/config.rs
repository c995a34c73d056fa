use chrono::Duration;
use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::cache::ValidationPolicy;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_AGE_DAYS: i64 = 7;
const DEFAULT_FRESH_SECS: i64 = 30;
const DEFAULT_USER_TTL_DAYS: i64 = 7;
const DEFAULT_LINK_TYPE: &str = "Relates";
const DEFAULT_MAX_WIDTH: usize = 110;

// ============================================================================
// File format
// ============================================================================

/// On-disk configuration. Every value is optional; the environment fills gaps
/// and overrides what is set here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
  #[serde(default)]
  pub jira: JiraFileConfig,
  pub default_project: Option<String>,
  #[serde(default)]
  pub cache: CacheFileConfig,
  pub link_type: Option<String>,
  pub max_width: Option<usize>,
  /// JSON file holding named JQL filters
  pub filters_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JiraFileConfig {
  pub url: Option<String>,
  pub email: Option<String>,
  /// Custom field name for epic link (e.g., "customfield_10014")
  pub epic_link_field: Option<String>,
  pub epic_name_field: Option<String>,
  pub auth_type: Option<AuthType>,
  pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheFileConfig {
  pub dir: Option<PathBuf>,
  pub policy: Option<PolicyKind>,
  pub max_age_days: Option<i64>,
  pub fresh_secs: Option<i64>,
  pub user_ttl_days: Option<i64>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
  /// Compare the remote `updated` timestamp on every read
  #[default]
  Timestamp,
  /// Trust entries younger than `max_age_days`
  Age,
}

impl PolicyKind {
  fn parse(s: &str) -> Option<Self> {
    match s.trim().to_lowercase().as_str() {
      "timestamp" => Some(Self::Timestamp),
      "age" => Some(Self::Age),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
  /// Auto-detect based on URL: .atlassian.net = cloud, else on-premise
  #[default]
  Auto,
  /// Jira Cloud - uses Basic auth (email + API token as password)
  Cloud,
  /// Jira On-premise - uses Bearer auth (PAT)
  Onpremise,
}

impl AuthType {
  fn parse(s: &str) -> Option<Self> {
    match s.trim().to_lowercase().as_str() {
      "auto" => Some(Self::Auto),
      "cloud" => Some(Self::Cloud),
      "onpremise" | "on-premise" | "server" => Some(Self::Onpremise),
      _ => None,
    }
  }

  /// Resolve `Auto` against the instance URL.
  pub fn effective(self, url: &str) -> Self {
    match self {
      Self::Auto if url.contains(".atlassian.net") => Self::Cloud,
      Self::Auto => Self::Onpremise,
      other => other,
    }
  }
}

// ============================================================================
// Resolved configuration
// ============================================================================

#[derive(Debug, Clone)]
pub struct Config {
  pub jira: JiraConfig,
  pub default_project: Option<String>,
  pub cache: CacheConfig,
  /// Link type used by the `link` command
  pub link_type: String,
  pub max_width: usize,
  pub filters_file: PathBuf,
}

#[derive(Clone)]
pub struct JiraConfig {
  pub url: String,
  pub email: Option<String>,
  pub token: String,
  pub auth_type: AuthType,
  pub epic_link_field: Option<String>,
  pub epic_name_field: Option<String>,
  pub timeout_secs: u64,
}

impl fmt::Debug for JiraConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("JiraConfig")
      .field("url", &self.url)
      .field("email", &self.email)
      .field("token", &"[REDACTED]")
      .field("auth_type", &self.auth_type)
      .field("epic_link_field", &self.epic_link_field)
      .field("epic_name_field", &self.epic_name_field)
      .field("timeout_secs", &self.timeout_secs)
      .finish()
  }
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
  pub dir: PathBuf,
  pub policy: ValidationPolicy,
  /// Entries younger than this are served without a staleness check
  pub fresh_for: Duration,
  pub user_ttl: Duration,
}

impl Config {
  /// Load configuration from file and environment.
  ///
  /// File search order:
  /// 1. Explicit path if provided (must exist)
  /// 2. ./jirash.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/jirash/config.yaml
  ///
  /// A `.env` file in the working directory is loaded before reading the environment.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = match explicit_path {
      Some(p) if p.exists() => Some(p.to_path_buf()),
      Some(p) => return Err(eyre!("Config file not found: {}", p.display())),
      None => Self::find_config_file(),
    };

    let file = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => ConfigFile::default(),
    };

    // A missing .env is normal
    let _ = dotenvy::dotenv();

    Self::resolve(file, |name| std::env::var(name).ok())
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("jirash.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("jirash").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<ConfigFile> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  /// Merge file values with an environment lookup. Environment wins.
  pub fn resolve<F>(file: ConfigFile, env: F) -> Result<Self>
  where
    F: Fn(&str) -> Option<String>,
  {
    let env = |name: &str| env(name).filter(|v| !v.trim().is_empty());

    let url = env("JIRA_URL")
      .or(file.jira.url)
      .map(|u| u.trim_end_matches('/').to_string())
      .ok_or_else(|| {
        eyre!("Jira URL not configured. Set JIRA_URL or jira.url in the config file.")
      })?;

    let token = env("JIRASH_JIRA_TOKEN")
      .or_else(|| env("JIRA_API_TOKEN"))
      .ok_or_else(|| {
        eyre!(
          "Jira API token not found. Set JIRASH_JIRA_TOKEN or JIRA_API_TOKEN environment variable."
        )
      })?;

    let auth_type = match env("JIRA_AUTH_TYPE") {
      Some(raw) => AuthType::parse(&raw)
        .ok_or_else(|| eyre!("Invalid JIRA_AUTH_TYPE '{}': use auto, cloud or onpremise", raw))?,
      None => file.jira.auth_type.unwrap_or_default(),
    };

    let email = env("JIRA_USERNAME")
      .or_else(|| env("JIRA_EMAIL"))
      .or(file.jira.email);
    if auth_type.effective(&url) == AuthType::Cloud && email.is_none() {
      return Err(eyre!(
        "Jira user not configured. Set JIRA_USERNAME (the account email) for Jira Cloud."
      ));
    }

    let timeout_secs = match env("JIRA_TIMEOUT_SECS") {
      Some(raw) => parse_number(&raw, "JIRA_TIMEOUT_SECS")?,
      None => file.jira.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
    };

    let cache = Self::resolve_cache(file.cache, &env)?;

    let filters_file = match env("JIRASH_FILTERS_FILE").map(PathBuf::from).or(file.filters_file) {
      Some(path) => path,
      None => dirs::config_dir()
        .map(|dir| dir.join("jirash"))
        .unwrap_or_else(|| cache.dir.clone())
        .join("filters.json"),
    };

    Ok(Config {
      jira: JiraConfig {
        url,
        email,
        token,
        auth_type,
        epic_link_field: env("EPIC_LINK_FIELD_ID").or(file.jira.epic_link_field),
        epic_name_field: env("EPIC_NAME_FIELD_ID").or(file.jira.epic_name_field),
        timeout_secs,
      },
      default_project: env("JIRA_PROJECT")
        .or(file.default_project)
        .map(|p| p.to_uppercase()),
      cache,
      link_type: env("JIRASH_LINK_TYPE")
        .or(file.link_type)
        .unwrap_or_else(|| DEFAULT_LINK_TYPE.to_string()),
      max_width: file.max_width.unwrap_or(DEFAULT_MAX_WIDTH),
      filters_file,
    })
  }

  fn resolve_cache<F>(file: CacheFileConfig, env: &F) -> Result<CacheConfig>
  where
    F: Fn(&str) -> Option<String>,
  {
    let dir = match env("JIRASH_CACHE_DIR").map(PathBuf::from).or(file.dir) {
      Some(dir) => dir,
      None => dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|p| p.join(".cache")))
        .ok_or_else(|| eyre!("Could not determine cache directory; set JIRASH_CACHE_DIR"))?
        .join("jirash"),
    };

    let kind = match env("JIRASH_CACHE_POLICY") {
      Some(raw) => PolicyKind::parse(&raw)
        .ok_or_else(|| eyre!("Invalid JIRASH_CACHE_POLICY '{}': use timestamp or age", raw))?,
      None => file.policy.unwrap_or_default(),
    };

    let max_age_days = match env("JIRASH_CACHE_MAX_AGE_DAYS") {
      Some(raw) => parse_number(&raw, "JIRASH_CACHE_MAX_AGE_DAYS")?,
      None => file.max_age_days.unwrap_or(DEFAULT_MAX_AGE_DAYS),
    };

    let fresh_secs = match env("JIRASH_CACHE_FRESH_SECS") {
      Some(raw) => parse_number(&raw, "JIRASH_CACHE_FRESH_SECS")?,
      None => file.fresh_secs.unwrap_or(DEFAULT_FRESH_SECS),
    };

    let policy = match kind {
      PolicyKind::Timestamp => ValidationPolicy::UpdatedTimestamp,
      PolicyKind::Age => ValidationPolicy::MaxAge(span(
        Duration::try_days,
        max_age_days,
        "JIRASH_CACHE_MAX_AGE_DAYS",
      )?),
    };

    let user_ttl_days = file.user_ttl_days.unwrap_or(DEFAULT_USER_TTL_DAYS);

    Ok(CacheConfig {
      dir,
      policy,
      fresh_for: span(Duration::try_seconds, fresh_secs.max(0), "JIRASH_CACHE_FRESH_SECS")?,
      user_ttl: span(Duration::try_days, user_ttl_days, "cache.user_ttl_days")?,
    })
  }
}

/// `make(value)` or an error naming the setting when it does not fit a duration.
fn span(make: fn(i64) -> Option<Duration>, value: i64, name: &str) -> Result<Duration> {
  make(value).ok_or_else(|| eyre!("Invalid {} '{}': value out of range", name, value))
}

fn parse_number<T: std::str::FromStr>(raw: &str, name: &str) -> Result<T> {
  raw
    .trim()
    .parse()
    .map_err(|_| eyre!("Invalid {} '{}': expected a number", name, raw))
}
