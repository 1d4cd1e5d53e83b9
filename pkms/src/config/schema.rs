//! Configuration schema definitions.
//!
//! This module defines the configuration structure for pkms: where the
//! workspace and index database live, how the filesystem checker behaves,
//! and the default resolution options.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::logging::LogLevel;

/// Default index database file name inside the workspace.
pub const DEFAULT_DATABASE_FILE: &str = "index.db";

/// Default busy timeout for the index database, in milliseconds.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

/// Default trash directory name searched next to recorded locations.
pub const DEFAULT_TRASH_DIR: &str = ".trash";

/// Complete configuration structure.
///
/// Every field is optional so that partial files can be layered; see
/// [`ConfigBuilder`](crate::config::ConfigBuilder) for the precedence rules.
///
/// # Examples
///
/// ```
/// use pkms::config::{CheckerConfig, Config};
///
/// let config = Config {
///     checker: Some(CheckerConfig {
///         verify_hash: Some(false),
///         ..Default::default()
///     }),
///     ..Default::default()
/// };
/// assert_eq!(config.checker.unwrap().verify_hash, Some(false));
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Workspace directory holding `config.yaml` and the index database.
    pub workspace_dir: Option<PathBuf>,

    /// Index database settings.
    pub database: Option<DatabaseSettings>,

    /// Existence checker settings.
    pub checker: Option<CheckerConfig>,

    /// Default resolution options.
    pub resolve: Option<ResolveConfig>,

    /// Log verbosity.
    pub log_mode: Option<LogLevel>,

    /// Output format for CLI commands.
    pub output_format: Option<OutputFormat>,
}

impl Config {
    /// Path of the index database, when the workspace is known.
    #[must_use]
    pub fn database_path(&self) -> Option<PathBuf> {
        let file_name = self
            .database
            .as_ref()
            .and_then(|db| db.file_name.as_deref())
            .unwrap_or(DEFAULT_DATABASE_FILE);
        self.workspace_dir.as_ref().map(|dir| dir.join(file_name))
    }

    /// Database busy timeout.
    #[must_use]
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(
            self.database
                .as_ref()
                .and_then(|db| db.busy_timeout_ms)
                .unwrap_or(DEFAULT_BUSY_TIMEOUT_MS),
        )
    }

    /// Caller-imposed timeout for existence checks, if configured.
    #[must_use]
    pub fn check_timeout(&self) -> Option<Duration> {
        self.checker
            .as_ref()
            .and_then(|c| c.timeout_ms)
            .map(Duration::from_millis)
    }

    /// Whether resolution reports lifecycle status by default.
    #[must_use]
    pub fn include_status(&self) -> bool {
        self.resolve
            .as_ref()
            .and_then(|r| r.include_status)
            .unwrap_or(false)
    }
}

/// Index database settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DatabaseSettings {
    /// File name of the database inside the workspace.
    pub file_name: Option<String>,

    /// Busy timeout in milliseconds.
    pub busy_timeout_ms: Option<u64>,
}

/// Existence checker settings.
///
/// # Examples
///
/// ```
/// use pkms::config::CheckerConfig;
/// use std::path::PathBuf;
///
/// let config = CheckerConfig {
///     verify_hash: Some(true),
///     trash_dirs: Some(vec![PathBuf::from(".trash")]),
///     vault_roots: Some(vec![PathBuf::from("/vault")]),
///     timeout_ms: Some(2000),
/// };
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CheckerConfig {
    /// Hash present bytes and compare with the recorded hash.
    pub verify_hash: Option<bool>,

    /// Trash directories. Relative entries are looked up in every ancestor
    /// of the recorded location.
    pub trash_dirs: Option<Vec<PathBuf>>,

    /// Vault roots walked to confirm that unknown references are absent.
    pub vault_roots: Option<Vec<PathBuf>>,

    /// Timeout for a single existence check, in milliseconds.
    pub timeout_ms: Option<u64>,
}

/// Default resolution options.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ResolveConfig {
    /// Populate `resolution_status` in responses.
    pub include_status: Option<bool>,
}

/// Output format for CLI commands.
///
/// # Examples
///
/// ```
/// use pkms::config::OutputFormat;
///
/// let format = OutputFormat::Json;
/// assert_eq!(format.to_string(), "json");
/// assert_eq!("human".parse::<OutputFormat>().unwrap(), OutputFormat::Human);
/// ```
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON output format.
    #[default]
    Json,
    /// Human-readable text.
    Human,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Human => write!(f, "human"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "human" => Ok(Self::Human),
            _ => Err(format!("invalid output format: {s} (expected json or human)")),
        }
    }
}
