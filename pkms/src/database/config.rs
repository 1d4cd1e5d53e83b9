//! Database configuration and workspace path resolution.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::environment::ENV_WORKSPACE_DIR;
use crate::config::schema::{DEFAULT_BUSY_TIMEOUT_MS, DEFAULT_DATABASE_FILE};
use crate::config::Config;
use crate::error::{Error, Result};

/// Name of the workspace directory under the home directory.
pub const WORKSPACE_DIR_NAME: &str = ".pkms";

/// Configuration for database connections.
///
/// # Examples
///
/// ```
/// use pkms::database::DatabaseConfig;
/// use std::time::Duration;
///
/// let config = DatabaseConfig::new("/tmp/index.db")
///     .with_busy_timeout(Duration::from_millis(10000));
/// assert!(config.auto_create);
/// ```
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Path to the database file.
    pub path: PathBuf,
    /// Busy timeout for database lock contention.
    pub busy_timeout: Duration,
    /// Whether to automatically create the database if it doesn't exist.
    pub auto_create: bool,
    /// Whether to open the database in read-only mode.
    pub read_only: bool,
}

impl DatabaseConfig {
    /// Creates a new database configuration with default settings.
    ///
    /// Defaults: 5000ms busy timeout, auto-create, read-write.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            busy_timeout: Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
            auto_create: true,
            read_only: false,
        }
    }

    /// Database settings derived from a built [`Config`].
    ///
    /// # Errors
    ///
    /// Returns a validation error when the config has no workspace directory.
    pub fn from_config(config: &Config) -> Result<Self> {
        let path = config.database_path().ok_or_else(|| Error::Validation {
            field: "workspace_dir".into(),
            message: "workspace directory is not configured".into(),
        })?;
        Ok(Self::new(path).with_busy_timeout(config.busy_timeout()))
    }

    /// Sets the busy timeout duration.
    #[must_use]
    pub const fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Configures the database to be opened in read-only mode.
    ///
    /// When read-only is enabled, `auto_create` is automatically disabled.
    ///
    /// # Examples
    ///
    /// ```
    /// use pkms::database::DatabaseConfig;
    ///
    /// let config = DatabaseConfig::new("/tmp/index.db").read_only();
    /// assert!(config.read_only);
    /// assert!(!config.auto_create);
    /// ```
    #[must_use]
    pub const fn read_only(mut self) -> Self {
        self.read_only = true;
        self.auto_create = false;
        self
    }
}

/// Returns the default workspace directory, `~/.pkms`.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn default_workspace_dir() -> Result<PathBuf> {
    let home = home::home_dir().ok_or_else(|| Error::Validation {
        field: "home_directory".into(),
        message: "cannot determine home directory".into(),
    })?;
    Ok(home.join(WORKSPACE_DIR_NAME))
}

/// Resolves the workspace directory.
///
/// 1. `$PKMS_WORKSPACE_DIR` if set and non-empty
/// 2. `~/.pkms` otherwise
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined and
/// `PKMS_WORKSPACE_DIR` is not set.
pub fn resolve_workspace_dir() -> Result<PathBuf> {
    match std::env::var(ENV_WORKSPACE_DIR) {
        Ok(dir) if !dir.is_empty() => Ok(PathBuf::from(dir)),
        _ => default_workspace_dir(),
    }
}

/// Resolves the default index database path, `<workspace>/index.db`.
///
/// # Errors
///
/// See [`resolve_workspace_dir`].
pub fn resolve_database_path() -> Result<PathBuf> {
    Ok(resolve_workspace_dir()?.join(DEFAULT_DATABASE_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;
    use serial_test::serial;

    #[test]
    fn test_config_new() {
        let config = DatabaseConfig::new("/tmp/test.db");
        assert_eq!(config.path, PathBuf::from("/tmp/test.db"));
        assert_eq!(config.busy_timeout, Duration::from_millis(5000));
        assert!(config.auto_create);
        assert!(!config.read_only);
    }

    #[test]
    fn test_config_read_only() {
        let config = DatabaseConfig::new("/tmp/test.db").read_only();
        assert!(config.read_only);
        assert!(!config.auto_create);
    }

    #[test]
    fn test_from_config() {
        let config = ConfigBuilder::new()
            .skip_files()
            .skip_env()
            .with_workspace_dir(Path::new("/ws"))
            .build()
            .unwrap();
        let db = DatabaseConfig::from_config(&config).unwrap();
        assert_eq!(db.path, PathBuf::from("/ws/index.db"));
        assert_eq!(db.busy_timeout, Duration::from_millis(5000));

        assert!(DatabaseConfig::from_config(&Config::default()).is_err());
    }

    #[test]
    #[serial]
    fn test_resolve_database_path() {
        std::env::remove_var(ENV_WORKSPACE_DIR);
        if let Ok(path) = resolve_database_path() {
            assert!(path.ends_with(".pkms/index.db"));
        }

        std::env::set_var(ENV_WORKSPACE_DIR, "/custom/ws");
        let path = resolve_database_path();
        std::env::remove_var(ENV_WORKSPACE_DIR);
        assert_eq!(path.unwrap(), PathBuf::from("/custom/ws/index.db"));
    }
}
