//! Utility functions for CLI operations.
//!
//! This module provides helpers shared across CLI commands: configuration
//! loading, opening the index, and assembling the resolver collaborators.

use crate::error::CliError;
use pkms::config::DatabaseSettings;
use pkms::database::resolve_workspace_dir;
use pkms::resolver::FilesystemCheckConfig;
use pkms::{Config, ConfigBuilder, DatabaseConfig, LogLevel, SqliteIdentityStore};
use std::path::{Path, PathBuf};

/// Global CLI options shared across all commands.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Enable verbose output.
    pub verbose: bool,

    /// Suppress non-essential output.
    pub quiet: bool,

    /// Override the workspace directory location.
    pub workspace_dir: Option<PathBuf>,

    /// Override the index busy timeout (in milliseconds).
    pub busy_timeout: Option<u64>,
}

/// Load hierarchical configuration.
///
/// Configuration is merged from multiple sources with precedence:
/// 1. Global options (highest priority)
/// 2. Environment variables
/// 3. Configuration files
/// 4. Built-in defaults (lowest priority)
pub fn load_configuration(global: &GlobalOptions) -> Result<Config, CliError> {
    let mut builder = ConfigBuilder::new();

    if let Some(ref dir) = global.workspace_dir {
        builder = builder.with_workspace_dir(dir);
    }

    if let Some(millis) = global.busy_timeout {
        builder = builder.with_config(Config {
            database: Some(DatabaseSettings {
                file_name: None,
                busy_timeout_ms: Some(millis),
            }),
            ..Config::default()
        });
    }

    builder
        .build()
        .map_err(|e| CliError::Config(e.to_string()))
}

/// The `log_mode` of the layered configuration, if it loads.
pub fn configured_log_mode(global: &GlobalOptions) -> Option<LogLevel> {
    load_configuration(global).ok().and_then(|config| config.log_mode)
}

/// The workspace directory named by the flags, or the default one.
pub fn workspace_dir(global: &GlobalOptions) -> Result<PathBuf, CliError> {
    match global.workspace_dir {
        Some(ref dir) => Ok(dir.clone()),
        None => resolve_workspace_dir().map_err(|e| CliError::Config(e.to_string())),
    }
}

/// Opens the index read-only for resolution.
///
/// # Errors
///
/// Returns `NoWorkspace` if the index database does not exist.
pub fn open_store(config: &Config) -> Result<SqliteIdentityStore, CliError> {
    let db_config =
        DatabaseConfig::from_config(config).map_err(|e| CliError::Config(e.to_string()))?;
    log::debug!("opening index {}", db_config.path.display());
    SqliteIdentityStore::open_read_only(db_config).map_err(CliError::from)
}

/// Filesystem checker parameters from the `checker` section.
pub fn checker_config(config: &Config) -> FilesystemCheckConfig {
    config
        .checker
        .as_ref()
        .map(FilesystemCheckConfig::from)
        .unwrap_or_default()
}

/// Shorten a path for display.
///
/// If the path is within the home directory, show it as ~/...
/// Otherwise, show the full path.
pub fn shorten_path(path: &Path) -> String {
    if let Some(home) = home::home_dir() {
        if let Ok(relative) = path.strip_prefix(&home) {
            return format!("~/{}", relative.display());
        }
    }
    path.display().to_string()
}
