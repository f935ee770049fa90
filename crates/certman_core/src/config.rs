//! Application configuration.
//!
//! # Responsibility
//! - Describe where the two stores live and which password is used when
//!   none is entered.
//! - Load that description from a TOML file, filling unset keys with
//!   defaults.
//!
//! # Invariants
//! - Configuration is an explicit value handed to constructors; nothing in
//!   core reads process-wide settings.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: io::Error },
    Parse { path: PathBuf, source: toml::de::Error },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "cannot read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "cannot parse config `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
        }
    }
}

/// Settings consumed by the stores and the command service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CertmanConfig {
    /// Root directory of the file store.
    pub store_path: PathBuf,
    /// SQLite database file of the relational store.
    pub db: PathBuf,
    /// Substituted when a record is entered without a password.
    pub default_password: String,
    pub log_level: String,
    /// File logging is enabled only when set.
    pub log_dir: Option<PathBuf>,
}

impl Default for CertmanConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("certificates"),
            db: PathBuf::from("certman.db"),
            default_password: "changeme".to_string(),
            log_level: "info".to_string(),
            log_dir: None,
        }
    }
}

impl CertmanConfig {
    /// Parses configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Reads and parses a TOML config file.
    ///
    /// # Errors
    /// - `Io` when the file cannot be read (including when it is missing).
    /// - `Parse` when the content is not valid configuration.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Like [`CertmanConfig::load`], but a missing file yields defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            other => other,
        }
    }
}

impl Display for CertmanConfig {
    /// Settings listing with the default password masked.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "store_path = {}", self.store_path.display())?;
        writeln!(f, "db = {}", self.db.display())?;
        writeln!(
            f,
            "default_password = {}",
            "*".repeat(self.default_password.chars().count())
        )?;
        writeln!(f, "log_level = {}", self.log_level)?;
        match &self.log_dir {
            Some(dir) => write!(f, "log_dir = {}", dir.display()),
            None => write!(f, "log_dir = (disabled)"),
        }
    }
}
