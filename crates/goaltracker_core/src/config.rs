//! Tracker configuration file and persistence-unit selection.
//!
//! # Responsibility
//! - Parse the TOML configuration file into typed settings.
//! - Resolve one named persistence unit into a concrete storage target.
//!
//! # Invariants
//! - A persistence unit targets exactly one of a database file or memory.
//! - Database paths are absolute.
//! - Missing `[logging]`/`[dispatch]` sections fall back to defaults.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Persistence unit selected when none is given on the command line.
pub const DEFAULT_PERSISTENCE_UNIT: &str = "default";
const DEFAULT_DATABASE_FILE_NAME: &str = "goaltracker.sqlite3";
const DEFAULT_WORKERS: usize = 2;
const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Errors raised while loading or resolving configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
    UnknownPersistenceUnit(String),
    InvalidPersistenceUnit { name: String, reason: String },
    InvalidDispatch(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config file: {err}"),
            Self::UnknownPersistenceUnit(name) => {
                write!(f, "persistence unit `{name}` is not configured")
            }
            Self::InvalidPersistenceUnit { name, reason } => {
                write!(f, "persistence unit `{name}` is invalid: {reason}")
            }
            Self::InvalidDispatch(reason) => write!(f, "invalid dispatch settings: {reason}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

/// Raw `[persistence.<name>]` table.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PersistenceUnitSettings {
    pub database: Option<PathBuf>,
    #[serde(default)]
    pub in_memory: bool,
}

/// `[logging]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level_owned")]
    pub level: String,
    pub dir: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level_owned(),
            dir: None,
        }
    }
}

impl LoggingSettings {
    /// Returns the configured log directory or a per-user temp fallback.
    pub fn effective_dir(&self) -> PathBuf {
        self.dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("goaltracker-logs"))
    }
}

/// `[dispatch]` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchSettings {
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Parsed configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrackerConfig {
    #[serde(default)]
    pub persistence: BTreeMap<String, PersistenceUnitSettings>,
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub dispatch: DispatchSettings,
}

/// Where a persistence unit stores its data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageTarget {
    File(PathBuf),
    InMemory,
}

/// A validated, named storage configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistenceUnit {
    pub name: String,
    pub target: StorageTarget,
}

impl TrackerConfig {
    /// Reads and parses a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate_dispatch()?;
        Ok(config)
    }

    /// Configuration used when no file is supplied.
    ///
    /// The `default` unit stores data under `data_dir`.
    pub fn builtin(data_dir: impl AsRef<Path>) -> Self {
        let mut persistence = BTreeMap::new();
        persistence.insert(
            DEFAULT_PERSISTENCE_UNIT.to_string(),
            PersistenceUnitSettings {
                database: Some(data_dir.as_ref().join(DEFAULT_DATABASE_FILE_NAME)),
                in_memory: false,
            },
        );
        persistence.insert(
            "memory".to_string(),
            PersistenceUnitSettings {
                database: None,
                in_memory: true,
            },
        );
        Self {
            persistence,
            logging: LoggingSettings::default(),
            dispatch: DispatchSettings::default(),
        }
    }

    /// Returns configured unit names in sorted order.
    pub fn unit_names(&self) -> Vec<String> {
        self.persistence.keys().cloned().collect()
    }

    /// Resolves the persistence unit called `name`.
    ///
    /// # Errors
    /// - `UnknownPersistenceUnit` when no such table exists.
    /// - `InvalidPersistenceUnit` when the name or target is malformed.
    pub fn persistence_unit(&self, name: &str) -> Result<PersistenceUnit, ConfigError> {
        let name = name.trim();
        if !is_valid_unit_name(name) {
            return Err(ConfigError::InvalidPersistenceUnit {
                name: name.to_string(),
                reason: "expected lowercase letters, digits, `_` or `-`".to_string(),
            });
        }
        let settings = self
            .persistence
            .get(name)
            .ok_or_else(|| ConfigError::UnknownPersistenceUnit(name.to_string()))?;

        let invalid = |reason: &str| ConfigError::InvalidPersistenceUnit {
            name: name.to_string(),
            reason: reason.to_string(),
        };
        let target = match (&settings.database, settings.in_memory) {
            (Some(_), true) => return Err(invalid("set either `database` or `in_memory`")),
            (None, false) => return Err(invalid("missing `database` path")),
            (None, true) => StorageTarget::InMemory,
            (Some(path), false) if !path.is_absolute() => {
                return Err(invalid("`database` must be an absolute path"))
            }
            (Some(path), false) => StorageTarget::File(path.clone()),
        };

        Ok(PersistenceUnit {
            name: name.to_string(),
            target,
        })
    }

    fn validate_dispatch(&self) -> Result<(), ConfigError> {
        if self.dispatch.workers == 0 {
            return Err(ConfigError::InvalidDispatch(
                "`workers` must be at least 1".to_string(),
            ));
        }
        if self.dispatch.queue_capacity == 0 {
            return Err(ConfigError::InvalidDispatch(
                "`queue_capacity` must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn is_valid_unit_name(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}

fn default_log_level_owned() -> String {
    crate::logging::default_log_level().to_string()
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}
