//! File configuration for the contribution store.
//!
//! # Responsibility
//! - Load `contrib.toml` (or an explicit path) into [`CoreConfig`].
//! - Validate values that would otherwise fail late (log level, log dir).
//!
//! # Invariants
//! - A missing default file yields defaults; a missing explicit file is an
//!   error.

use crate::logging::normalize_level;
use crate::service::sync_service::SyncOptions;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "contrib.toml";
pub const DEFAULT_DATABASE_FILE: &str = "contrib.db";

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: toml::de::Error },
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "failed to parse config `{}`: {source}", path.display())
            }
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Invalid(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    pub database_path: PathBuf,
    /// `None` falls back to the build-mode default.
    pub log_level: Option<String>,
    /// `None` disables file logging.
    pub log_dir: Option<PathBuf>,
    pub atomic_run: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_FILE),
            log_level: None,
            log_dir: None,
            atomic_run: false,
        }
    }
}

impl CoreConfig {
    pub fn from_toml_str(contents: &str, origin: &Path) -> ConfigResult<Self> {
        let config: Self = toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database_path cannot be empty".to_string()));
        }
        if let Some(level) = &self.log_level {
            normalize_level(level).map_err(ConfigError::Invalid)?;
        }
        if let Some(dir) = &self.log_dir {
            if !dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "log_dir must be an absolute path, got `{}`",
                    dir.display()
                )));
            }
        }
        Ok(())
    }

    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            atomic_run: self.atomic_run,
        }
    }
}

/// Loads config from `path`, which must exist.
pub fn load_config(path: &Path) -> ConfigResult<CoreConfig> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    CoreConfig::from_toml_str(&contents, path)
}

/// Loads `path` when given, else `contrib.toml` when present, else defaults.
pub fn load_config_or_default(path: Option<&Path>) -> ConfigResult<CoreConfig> {
    if let Some(path) = path {
        return load_config(path);
    }
    let default_path = Path::new(DEFAULT_CONFIG_FILE);
    if default_path.exists() {
        return load_config(default_path);
    }
    Ok(CoreConfig::default())
}
