//! Reader core configuration.
//!
//! # Responsibility
//! - Hold the timeout policy bounding snapshot loads and ready waits.
//! - Read an optional TOML file, then apply `XYZREADER_*` env overrides.
//!
//! # Invariants
//! - Timeouts are strictly positive.
//! - `log_level` is one of `trace|debug|info|warn|error`.

use crate::logging::{default_log_level, normalize_level};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_LOAD_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_READY_TIMEOUT_MS: u64 = 3_000;

const ENV_LOG_LEVEL: &str = "XYZREADER_LOG_LEVEL";
const ENV_LOG_DIR: &str = "XYZREADER_LOG_DIR";
const ENV_DB_PATH: &str = "XYZREADER_DB_PATH";
const ENV_LOAD_TIMEOUT_MS: &str = "XYZREADER_LOAD_TIMEOUT_MS";
const ENV_READY_TIMEOUT_MS: &str = "XYZREADER_READY_TIMEOUT_MS";

#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(toml::de::Error),
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "cannot read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid reader config: {err}"),
            Self::InvalidValue { key, value, reason } => {
                write!(f, "invalid value `{value}` for `{key}`: {reason}")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::InvalidValue { .. } => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

/// Runtime settings for hosts embedding the reader core.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReaderConfig {
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
    /// Article database used by the SQLite provider.
    pub db_path: Option<PathBuf>,
    /// Upper bound for one dataset load.
    pub load_timeout_ms: u64,
    /// Upper bound for waiting on a screen's ready signal.
    pub ready_timeout_ms: u64,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level().to_string(),
            log_dir: None,
            db_path: None,
            load_timeout_ms: DEFAULT_LOAD_TIMEOUT_MS,
            ready_timeout_ms: DEFAULT_READY_TIMEOUT_MS,
        }
    }
}

impl ReaderConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` when it exists, then applies process env overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) if path.exists() => {
                let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml_str(&raw)?
            }
            _ => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Applies overrides from `lookup` (normally the process environment).
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_LOG_LEVEL) {
            self.log_level = value;
        }
        if let Some(value) = lookup(ENV_LOG_DIR) {
            self.log_dir = Some(PathBuf::from(value));
        }
        if let Some(value) = lookup(ENV_DB_PATH) {
            self.db_path = Some(PathBuf::from(value));
        }
        if let Some(value) = lookup(ENV_LOAD_TIMEOUT_MS) {
            self.load_timeout_ms = parse_millis(ENV_LOAD_TIMEOUT_MS, &value)?;
        }
        if let Some(value) = lookup(ENV_READY_TIMEOUT_MS) {
            self.ready_timeout_ms = parse_millis(ENV_READY_TIMEOUT_MS, &value)?;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        normalize_level(&self.log_level).map_err(|err| ConfigError::InvalidValue {
            key: "log_level",
            value: self.log_level.clone(),
            reason: err.to_string(),
        })?;
        for (key, value) in [
            ("load_timeout_ms", self.load_timeout_ms),
            ("ready_timeout_ms", self.ready_timeout_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    key,
                    value: value.to_string(),
                    reason: "must be greater than zero".to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }
}

fn parse_millis(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|err| ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            reason: err.to_string(),
        })
}
