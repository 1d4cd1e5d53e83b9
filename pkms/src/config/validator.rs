//! Configuration validation.
//!
//! This module validates configuration fields, ensuring that values are
//! usable before a store or checker is built from them.

use crate::config::schema::{CheckerConfig, Config, DatabaseSettings};
use crate::error::{Error, Result};
use std::path::Path;

/// Validates configuration values.
///
/// # Examples
///
/// ```
/// use pkms::config::{Config, ConfigValidator};
///
/// let config = Config::default();
/// ConfigValidator::validate(&config).unwrap();
/// ```
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate a complete configuration.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the first offending field.
    pub fn validate(config: &Config) -> Result<()> {
        if let Some(ref dir) = config.workspace_dir {
            Self::validate_path("workspace_dir", dir)?;
        }

        if let Some(ref database) = config.database {
            Self::validate_database(database)?;
        }

        if let Some(ref checker) = config.checker {
            Self::validate_checker(checker)?;
        }

        Ok(())
    }

    fn validate_database(database: &DatabaseSettings) -> Result<()> {
        if let Some(ref name) = database.file_name {
            if name.trim().is_empty() {
                return Err(Error::Validation {
                    field: "database.file_name".into(),
                    message: "cannot be empty".into(),
                });
            }
            if name.contains(['/', '\\', '\0']) {
                return Err(Error::Validation {
                    field: "database.file_name".into(),
                    message: "must be a plain file name".into(),
                });
            }
        }

        Self::validate_timeout("database.busy_timeout_ms", database.busy_timeout_ms)
    }

    fn validate_checker(checker: &CheckerConfig) -> Result<()> {
        Self::validate_timeout("checker.timeout_ms", checker.timeout_ms)?;

        for dir in checker.trash_dirs.iter().flatten() {
            Self::validate_path("checker.trash_dirs", dir)?;
        }

        for root in checker.vault_roots.iter().flatten() {
            Self::validate_path("checker.vault_roots", root)?;
        }

        Ok(())
    }

    fn validate_timeout(field: &str, timeout: Option<u64>) -> Result<()> {
        if timeout == Some(0) {
            return Err(Error::Validation {
                field: field.into(),
                message: "timeout must be greater than 0".into(),
            });
        }
        Ok(())
    }

    /// Path entries must be non-empty and free of NUL bytes.
    fn validate_path(field: &str, path: &Path) -> Result<()> {
        let text = path.to_string_lossy();
        if text.trim().is_empty() {
            return Err(Error::Validation {
                field: field.into(),
                message: "path cannot be empty".into(),
            });
        }
        if text.contains('\0') {
            return Err(Error::Validation {
                field: field.into(),
                message: "path cannot contain null bytes".into(),
            });
        }
        Ok(())
    }
}
