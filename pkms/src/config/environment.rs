//! Environment variable handling for configuration overrides.
//!
//! This module provides support for `PKMS_*` environment variables that
//! override configuration file values.

use crate::config::schema::{Config, DatabaseSettings, OutputFormat, ResolveConfig};
use crate::error::{Error, Result};
use crate::logging::LogLevel;
use std::env;
use std::path::PathBuf;

/// Workspace directory override.
pub const ENV_WORKSPACE_DIR: &str = "PKMS_WORKSPACE_DIR";
/// Log mode (`quiet`, `normal`, `verbose`).
pub const ENV_LOG_MODE: &str = "PKMS_LOG_MODE";
/// Enable or disable hash verification.
pub const ENV_VERIFY_HASH: &str = "PKMS_VERIFY_HASH";
/// Comma-separated trash directories.
pub const ENV_TRASH_DIRS: &str = "PKMS_TRASH_DIRS";
/// Comma-separated vault roots.
pub const ENV_VAULT_ROOTS: &str = "PKMS_VAULT_ROOTS";
/// Existence check timeout in milliseconds.
pub const ENV_CHECK_TIMEOUT_MS: &str = "PKMS_CHECK_TIMEOUT_MS";
/// Database busy timeout in milliseconds.
pub const ENV_BUSY_TIMEOUT_MS: &str = "PKMS_BUSY_TIMEOUT_MS";
/// Default for reporting lifecycle status.
pub const ENV_INCLUDE_STATUS: &str = "PKMS_INCLUDE_STATUS";
/// Output format (`json` or `human`).
pub const ENV_OUTPUT_FORMAT: &str = "PKMS_OUTPUT_FORMAT";

/// Handles environment variable overrides for configuration.
///
/// # Examples
///
/// ```no_run
/// use pkms::config::{Config, EnvironmentConfig};
///
/// let mut config = Config::default();
/// EnvironmentConfig::apply_overrides(&mut config).unwrap();
/// ```
pub struct EnvironmentConfig;

impl EnvironmentConfig {
    /// Apply environment variable overrides to config.
    ///
    /// # Errors
    ///
    /// Returns an error if any environment variable value is invalid
    /// (e.g., non-numeric timeout, invalid boolean).
    pub fn apply_overrides(config: &mut Config) -> Result<()> {
        if let Ok(dir) = env::var(ENV_WORKSPACE_DIR) {
            if !dir.is_empty() {
                config.workspace_dir = Some(PathBuf::from(dir));
            }
        }

        if let Ok(val) = env::var(ENV_LOG_MODE) {
            config.log_mode = Some(LogLevel::parse(&val).map_err(|message| Error::Validation {
                field: ENV_LOG_MODE.into(),
                message,
            })?);
        }

        if let Ok(val) = env::var(ENV_OUTPUT_FORMAT) {
            config.output_format =
                Some(val.parse::<OutputFormat>().map_err(|message| Error::Validation {
                    field: ENV_OUTPUT_FORMAT.into(),
                    message,
                })?);
        }

        if let Ok(val) = env::var(ENV_BUSY_TIMEOUT_MS) {
            let database = config.database.get_or_insert_with(DatabaseSettings::default);
            database.busy_timeout_ms = Some(Self::parse_millis(ENV_BUSY_TIMEOUT_MS, &val)?);
        }

        if let Ok(val) = env::var(ENV_INCLUDE_STATUS) {
            let resolve = config.resolve.get_or_insert_with(ResolveConfig::default);
            resolve.include_status = Some(Self::parse_bool(ENV_INCLUDE_STATUS, &val)?);
        }

        Self::apply_checker_overrides(config)?;

        Ok(())
    }

    /// Apply checker-related environment variable overrides.
    fn apply_checker_overrides(config: &mut Config) -> Result<()> {
        let mut checker = config.checker.clone().unwrap_or_default();
        let mut modified = false;

        if let Ok(val) = env::var(ENV_VERIFY_HASH) {
            checker.verify_hash = Some(Self::parse_bool(ENV_VERIFY_HASH, &val)?);
            modified = true;
        }

        if let Ok(val) = env::var(ENV_TRASH_DIRS) {
            checker.trash_dirs = Some(Self::parse_path_list(&val));
            modified = true;
        }

        if let Ok(val) = env::var(ENV_VAULT_ROOTS) {
            checker.vault_roots = Some(Self::parse_path_list(&val));
            modified = true;
        }

        if let Ok(val) = env::var(ENV_CHECK_TIMEOUT_MS) {
            checker.timeout_ms = Some(Self::parse_millis(ENV_CHECK_TIMEOUT_MS, &val)?);
            modified = true;
        }

        if modified {
            config.checker = Some(checker);
        }

        Ok(())
    }

    /// Parse a boolean value from a string.
    ///
    /// Accepts: true/1/yes/on for true, false/0/no/off for false (case-insensitive).
    fn parse_bool(field: &str, s: &str) -> Result<bool> {
        match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(Error::Validation {
                field: field.into(),
                message: format!(
                    "invalid boolean value: '{s}' (expected true/false/1/0/yes/no/on/off)"
                ),
            }),
        }
    }

    fn parse_millis(field: &str, s: &str) -> Result<u64> {
        s.trim().parse().map_err(|_| Error::Validation {
            field: field.into(),
            message: format!("must be a non-negative integer number of milliseconds, got '{s}'"),
        })
    }

    /// Split a comma-separated list of paths, skipping empty entries.
    fn parse_path_list(s: &str) -> Vec<PathBuf> {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(PathBuf::from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::CheckerConfig;
    use serial_test::serial;

    const ALL_VARS: [&str; 9] = [
        ENV_WORKSPACE_DIR,
        ENV_LOG_MODE,
        ENV_VERIFY_HASH,
        ENV_TRASH_DIRS,
        ENV_VAULT_ROOTS,
        ENV_CHECK_TIMEOUT_MS,
        ENV_BUSY_TIMEOUT_MS,
        ENV_INCLUDE_STATUS,
        ENV_OUTPUT_FORMAT,
    ];

    fn clear_env() {
        for var in ALL_VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_parse_bool_variants() {
        for value in ["true", "TRUE", "1", "yes", "On"] {
            assert!(EnvironmentConfig::parse_bool("test", value).unwrap());
        }
        for value in ["false", "FALSE", "0", "no", "Off"] {
            assert!(!EnvironmentConfig::parse_bool("test", value).unwrap());
        }
        assert!(EnvironmentConfig::parse_bool("test", "maybe").is_err());
    }

    #[test]
    fn test_parse_path_list() {
        let paths = EnvironmentConfig::parse_path_list(" /a , ,.trash,");
        assert_eq!(paths, vec![PathBuf::from("/a"), PathBuf::from(".trash")]);
        assert!(EnvironmentConfig::parse_path_list("").is_empty());
    }

    #[test]
    fn test_parse_millis() {
        assert_eq!(EnvironmentConfig::parse_millis("t", " 250 ").unwrap(), 250);
        assert!(EnvironmentConfig::parse_millis("t", "-1").is_err());
        assert!(EnvironmentConfig::parse_millis("t", "soon").is_err());
    }

    #[test]
    #[serial]
    fn test_apply_overrides_no_env_vars() {
        clear_env();
        let mut config = Config::default();
        EnvironmentConfig::apply_overrides(&mut config).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    #[serial]
    fn test_apply_overrides_all_vars() {
        clear_env();
        env::set_var(ENV_WORKSPACE_DIR, "/tmp/ws");
        env::set_var(ENV_LOG_MODE, "verbose");
        env::set_var(ENV_VERIFY_HASH, "off");
        env::set_var(ENV_TRASH_DIRS, ".trash,/var/trash");
        env::set_var(ENV_VAULT_ROOTS, "/vault");
        env::set_var(ENV_CHECK_TIMEOUT_MS, "1500");
        env::set_var(ENV_BUSY_TIMEOUT_MS, "200");
        env::set_var(ENV_INCLUDE_STATUS, "yes");
        env::set_var(ENV_OUTPUT_FORMAT, "human");

        let mut config = Config::default();
        let result = EnvironmentConfig::apply_overrides(&mut config);
        clear_env();
        result.unwrap();

        assert_eq!(config.workspace_dir, Some(PathBuf::from("/tmp/ws")));
        assert_eq!(config.log_mode, Some(LogLevel::Verbose));
        assert_eq!(config.output_format, Some(OutputFormat::Human));
        assert_eq!(config.database.unwrap().busy_timeout_ms, Some(200));
        assert_eq!(config.resolve.unwrap().include_status, Some(true));
        let checker = config.checker.unwrap();
        assert_eq!(checker.verify_hash, Some(false));
        assert_eq!(checker.trash_dirs.unwrap().len(), 2);
        assert_eq!(checker.vault_roots, Some(vec![PathBuf::from("/vault")]));
        assert_eq!(checker.timeout_ms, Some(1500));
    }

    #[test]
    #[serial]
    fn test_env_overrides_keep_file_values() {
        clear_env();
        env::set_var(ENV_CHECK_TIMEOUT_MS, "900");
        let mut config = Config {
            checker: Some(CheckerConfig {
                verify_hash: Some(false),
                ..Default::default()
            }),
            ..Default::default()
        };
        let result = EnvironmentConfig::apply_overrides(&mut config);
        clear_env();
        result.unwrap();

        let checker = config.checker.unwrap();
        assert_eq!(checker.verify_hash, Some(false));
        assert_eq!(checker.timeout_ms, Some(900));
    }

    #[test]
    #[serial]
    fn test_invalid_env_values_are_rejected() {
        for (var, value) in [
            (ENV_OUTPUT_FORMAT, "table"),
            (ENV_LOG_MODE, "loud"),
            (ENV_VERIFY_HASH, "maybe"),
            (ENV_BUSY_TIMEOUT_MS, "fast"),
        ] {
            clear_env();
            env::set_var(var, value);
            let result = EnvironmentConfig::apply_overrides(&mut Config::default());
            clear_env();
            match result {
                Err(Error::Validation { field, .. }) => assert_eq!(field, var),
                other => panic!("expected validation error for {var}, got {other:?}"),
            }
        }
    }
}
