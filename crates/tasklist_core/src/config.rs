//! Runtime configuration: backend selection, debounce windows, logging.
//!
//! # Responsibility
//! - Deserialize the JSON config file into typed settings.
//! - Reject settings that would only fail later at first request.
//!
//! # Invariants
//! - Every field except `backend` has a default.
//! - `validate()` never touches the network or the filesystem.

use crate::logging::{default_log_level, normalize_level};
use crate::search::debounce::{PULL_DEBOUNCE_WINDOW, PUSH_DEBOUNCE_WINDOW};
use crate::sync::realtime::DEFAULT_ROOT;
use crate::sync::rest::{DEFAULT_COLLECTION, DEFAULT_REQUEST_TIMEOUT};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Base URL used when no config file is given (local json-server).
pub const DEFAULT_BASE_URL: &str = "http://localhost:3005";

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config json: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Top-level configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub backend: BackendConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote store selection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    /// JSON REST collection, reloaded after every mutation.
    Rest {
        base_url: String,
        #[serde(default = "default_collection")]
        collection: String,
        #[serde(default = "default_timeout_ms")]
        timeout_ms: u64,
    },
    /// Embedded realtime tree streaming snapshots to subscribers.
    Realtime {
        /// In-memory tree when absent.
        #[serde(default)]
        db_path: Option<PathBuf>,
        #[serde(default = "default_root")]
        root: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
    #[serde(default = "default_pull_debounce_ms")]
    pub pull_debounce_ms: u64,
    #[serde(default = "default_push_debounce_ms")]
    pub push_debounce_ms: u64,
}

impl SearchConfig {
    pub fn pull_window(&self) -> Duration {
        Duration::from_millis(self.pull_debounce_ms)
    }

    pub fn push_window(&self) -> Duration {
        Duration::from_millis(self.push_debounce_ms)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            pull_debounce_ms: default_pull_debounce_ms(),
            push_debounce_ms: default_push_debounce_ms(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Defaults to the build-mode level.
    #[serde(default)]
    pub level: Option<String>,
    /// Absolute log directory; file logging stays off when absent.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl LoggingConfig {
    pub fn effective_level(&self) -> &str {
        self.level.as_deref().unwrap_or(default_log_level())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::Rest {
                base_url: DEFAULT_BASE_URL.to_string(),
                collection: default_collection(),
                timeout_ms: default_timeout_ms(),
            },
            search: SearchConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Parses and validates a JSON config document.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.backend {
            BackendConfig::Rest {
                base_url,
                collection,
                timeout_ms,
            } => {
                let base_url = base_url.trim();
                if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
                    return Err(ConfigError::Invalid(format!(
                        "backend.base_url must be an http(s) url, got `{base_url}`"
                    )));
                }
                require_segment("backend.collection", collection)?;
                if *timeout_ms == 0 {
                    return Err(ConfigError::Invalid(
                        "backend.timeout_ms must be positive".to_string(),
                    ));
                }
            }
            BackendConfig::Realtime { root, .. } => require_segment("backend.root", root)?,
        }

        if let Some(level) = &self.logging.level {
            normalize_level(level).map_err(|err| ConfigError::Invalid(err.to_string()))?;
        }
        if let Some(dir) = &self.logging.dir {
            if !dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "logging.dir must be absolute, got `{}`",
                    dir.display()
                )));
            }
        }
        Ok(())
    }
}

fn require_segment(name: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim().trim_matches('/');
    if trimmed.is_empty() || trimmed.contains('/') {
        return Err(ConfigError::Invalid(format!(
            "{name} must be a single non-empty path segment, got `{value}`"
        )));
    }
    Ok(())
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

fn default_root() -> String {
    DEFAULT_ROOT.to_string()
}

fn default_timeout_ms() -> u64 {
    u64::try_from(DEFAULT_REQUEST_TIMEOUT.as_millis()).unwrap_or(u64::MAX)
}

fn default_pull_debounce_ms() -> u64 {
    u64::try_from(PULL_DEBOUNCE_WINDOW.as_millis()).unwrap_or(u64::MAX)
}

fn default_push_debounce_ms() -> u64 {
    u64::try_from(PUSH_DEBOUNCE_WINDOW.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, BackendConfig, ConfigError, LoggingConfig, DEFAULT_BASE_URL};
    use crate::logging::default_log_level;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn rest_backend_fills_defaults() {
        let config =
            AppConfig::from_json_str(r#"{"backend": {"kind": "rest", "base_url": "http://127.0.0.1:3005"}}"#)
                .expect("config should parse");

        assert_eq!(
            config.backend,
            BackendConfig::Rest {
                base_url: "http://127.0.0.1:3005".to_string(),
                collection: "toDos".to_string(),
                timeout_ms: 10_000,
            }
        );
        assert_eq!(config.search.pull_window(), Duration::from_millis(500));
        assert_eq!(config.search.push_window(), Duration::from_millis(10));
    }

    #[test]
    fn realtime_backend_parses_path_and_root() {
        let config = AppConfig::from_json_str(
            r#"{
                "backend": {"kind": "realtime", "db_path": "/var/lib/tasks.db", "root": "todos"},
                "search": {"push_debounce_ms": 25}
            }"#,
        )
        .expect("config should parse");

        assert_eq!(
            config.backend,
            BackendConfig::Realtime {
                db_path: Some(PathBuf::from("/var/lib/tasks.db")),
                root: "todos".to_string(),
            }
        );
        assert_eq!(config.search.push_debounce_ms, 25);
        assert_eq!(config.search.pull_debounce_ms, 500);
    }

    #[test]
    fn rejects_non_http_base_url_and_relative_log_dir() {
        let err = AppConfig::from_json_str(r#"{"backend": {"kind": "rest", "base_url": "ftp://x"}}"#)
            .expect_err("ftp must be rejected");
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = AppConfig::from_json_str(
            r#"{"backend": {"kind": "realtime"}, "logging": {"dir": "logs"}}"#,
        )
        .expect_err("relative log dir must be rejected");
        assert!(err.to_string().contains("absolute"));
    }

    #[test]
    fn rejects_unknown_top_level_keys() {
        let err = AppConfig::from_json_str(r#"{"backend": {"kind": "realtime"}, "retries": 3}"#)
            .expect_err("unknown key must be rejected");
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn default_points_at_local_json_server() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert!(matches!(
            config.backend,
            BackendConfig::Rest { ref base_url, .. } if base_url == DEFAULT_BASE_URL
        ));
    }

    #[test]
    fn logging_level_falls_back_to_build_default() {
        let unset = LoggingConfig::default();
        assert_eq!(unset.effective_level(), default_log_level());

        let set = LoggingConfig {
            level: Some("warn".to_string()),
            dir: None,
        };
        assert_eq!(set.effective_level(), "warn");
    }
}
