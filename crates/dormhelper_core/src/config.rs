//! Explicit configuration for store location and logging.
//!
//! # Responsibility
//! - Resolve where the store file lives before any connection is opened.
//! - Parse logging settings for hosts that want file logs.
//!
//! # Invariants
//! - Core code never reads the environment implicitly; hosts call
//!   `from_env` and inject the result.
//! - A blank `DORMHELPER_DB_PATH` falls back to the default store file.

use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Fixed store file name used when no explicit path is configured.
pub const STORE_FILE_NAME: &str = "dormhelper.db";

pub const ENV_DB_PATH: &str = "DORMHELPER_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "DORMHELPER_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "DORMHELPER_LOG_DIR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue { key: &'static str, message: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, message } => write!(f, "invalid value for {key}: {message}"),
        }
    }
}

impl Error for ConfigError {}

/// Where the store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// Single SQLite file on disk.
    File(PathBuf),
    /// Private in-memory store, discarded when the connection closes.
    Memory,
}

/// Store configuration injected into [`crate::Store::open`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub location: StoreLocation,
}

impl StoreConfig {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            location: StoreLocation::File(path.into()),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            location: StoreLocation::Memory,
        }
    }

    /// Store file next to the running executable.
    ///
    /// Falls back to the current directory when the executable path cannot be
    /// resolved.
    pub fn default_file() -> Self {
        let base = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));
        Self::at(base.join(STORE_FILE_NAME))
    }

    pub fn from_env() -> Self {
        Self::from_env_map(&std::env::vars().collect())
    }

    pub fn from_env_map(env_map: &HashMap<String, String>) -> Self {
        match env_map.get(ENV_DB_PATH).map(|raw| raw.trim()) {
            Some(path) if !path.is_empty() => Self::at(path),
            _ => Self::default_file(),
        }
    }

    /// Human-readable location for diagnostics.
    pub fn describe(&self) -> String {
        match &self.location {
            StoreLocation::File(path) => path.display().to_string(),
            StoreLocation::Memory => ":memory:".to_string(),
        }
    }
}

/// Supported log verbosity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(ConfigError::InvalidValue {
                key: ENV_LOG_LEVEL,
                message: format!("unsupported log level `{other}`; expected trace|debug|info|warn|error"),
            }),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// `debug` for debug builds, `info` for release builds.
    pub fn build_default() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Info
        }
    }
}

/// File logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub log_dir: PathBuf,
}

impl LoggingConfig {
    /// Validates an absolute, non-empty log directory.
    pub fn new(level: LogLevel, log_dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = log_dir.as_ref();
        let trimmed = raw.to_string_lossy();
        let trimmed = trimmed.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: ENV_LOG_DIR,
                message: "log dir cannot be empty".to_string(),
            });
        }
        let path = Path::new(trimmed);
        if !path.is_absolute() {
            return Err(ConfigError::InvalidValue {
                key: ENV_LOG_DIR,
                message: format!("log dir must be an absolute path, got `{trimmed}`"),
            });
        }
        Ok(Self {
            level,
            log_dir: path.to_path_buf(),
        })
    }

    /// Returns `Ok(None)` when no log directory is configured.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        Self::from_env_map(&std::env::vars().collect())
    }

    pub fn from_env_map(env_map: &HashMap<String, String>) -> Result<Option<Self>, ConfigError> {
        let dir = match env_map.get(ENV_LOG_DIR).map(|raw| raw.trim()) {
            Some(dir) if !dir.is_empty() => dir,
            _ => return Ok(None),
        };
        let level = match env_map.get(ENV_LOG_LEVEL) {
            Some(raw) if !raw.trim().is_empty() => LogLevel::parse(raw)?,
            _ => LogLevel::build_default(),
        };
        Self::new(level, dir).map(Some)
    }
}
