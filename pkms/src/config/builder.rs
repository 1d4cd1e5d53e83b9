//! Layered configuration assembly.

use std::env;
use std::path::{Path, PathBuf};

use crate::config::environment::EnvironmentConfig;
use crate::config::loader::ConfigLoader;
use crate::config::merger::ConfigMerger;
use crate::config::schema::{
    CheckerConfig, Config, DatabaseSettings, OutputFormat, ResolveConfig, DEFAULT_BUSY_TIMEOUT_MS,
    DEFAULT_DATABASE_FILE, DEFAULT_TRASH_DIR,
};
use crate::config::validator::ConfigValidator;
use crate::database::{default_workspace_dir, resolve_workspace_dir};
use crate::error::Result;
use crate::logging::LogLevel;

/// Builds a [`Config`] from defaults, files, environment, and overrides.
///
/// Precedence, lowest to highest: built-in defaults, `<workspace>/config.yaml`,
/// `pkms.yaml`, `pkms.local.yaml`, `PKMS_*` variables, programmatic
/// overrides, and finally an explicit workspace directory.
///
/// # Examples
///
/// ```
/// use pkms::config::{Config, ConfigBuilder, OutputFormat};
///
/// let config = ConfigBuilder::new()
///     .skip_files()
///     .skip_env()
///     .with_config(Config {
///         output_format: Some(OutputFormat::Human),
///         ..Default::default()
///     })
///     .build()
///     .unwrap();
///
/// assert_eq!(config.output_format, Some(OutputFormat::Human));
/// assert_eq!(config.checker.unwrap().verify_hash, Some(true));
/// ```
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    working_dir: Option<PathBuf>,
    workspace_dir: Option<PathBuf>,
    overrides: Option<Config>,
    skip_files: bool,
    skip_env: bool,
}

impl ConfigBuilder {
    /// Creates a builder that reads every source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory project configuration discovery starts from.
    #[must_use]
    pub fn with_working_dir(mut self, dir: &Path) -> Self {
        self.working_dir = Some(dir.to_path_buf());
        self
    }

    /// Uses `dir` as the workspace, overriding `PKMS_WORKSPACE_DIR` and files.
    #[must_use]
    pub fn with_workspace_dir(mut self, dir: &Path) -> Self {
        self.workspace_dir = Some(dir.to_path_buf());
        self
    }

    /// Programmatic overrides applied above the environment.
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.overrides = Some(config);
        self
    }

    /// Do not read configuration files.
    #[must_use]
    pub const fn skip_files(mut self) -> Self {
        self.skip_files = true;
        self
    }

    /// Do not read `PKMS_*` environment variables.
    #[must_use]
    pub const fn skip_env(mut self) -> Self {
        self.skip_env = true;
        self
    }

    /// Built-in defaults.
    #[must_use]
    pub fn defaults() -> Config {
        Config {
            workspace_dir: None,
            database: Some(DatabaseSettings {
                file_name: Some(DEFAULT_DATABASE_FILE.to_string()),
                busy_timeout_ms: Some(DEFAULT_BUSY_TIMEOUT_MS),
            }),
            checker: Some(CheckerConfig {
                verify_hash: Some(true),
                trash_dirs: Some(vec![PathBuf::from(DEFAULT_TRASH_DIR)]),
                vault_roots: Some(Vec::new()),
                timeout_ms: None,
            }),
            resolve: Some(ResolveConfig {
                include_status: Some(false),
            }),
            log_mode: Some(LogLevel::Normal),
            output_format: Some(OutputFormat::Json),
        }
    }

    /// Assembles and validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be parsed, an environment variable
    /// is malformed, or the merged configuration fails validation.
    pub fn build(self) -> Result<Config> {
        let mut config = Self::defaults();

        let workspace = match self.workspace_dir {
            Some(ref dir) => Some(dir.clone()),
            None if self.skip_env => default_workspace_dir().ok(),
            None => resolve_workspace_dir().ok(),
        };

        if !self.skip_files {
            let working_dir = match self.working_dir {
                Some(ref dir) => dir.clone(),
                None => env::current_dir()?,
            };
            let sources = match workspace {
                Some(ref dir) => ConfigLoader::load_all(&working_dir, Some(dir))?,
                None => ConfigLoader::discover_project_configs(&working_dir)?,
            };
            for source in sources {
                ConfigMerger::merge_into(&mut config, &source.config);
            }
        }

        if !self.skip_env {
            EnvironmentConfig::apply_overrides(&mut config)?;
        }

        if let Some(ref overrides) = self.overrides {
            ConfigMerger::merge_into(&mut config, overrides);
        }

        if self.workspace_dir.is_some() || config.workspace_dir.is_none() {
            config.workspace_dir = workspace;
        }

        ConfigValidator::validate(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let temp = TempDir::new().unwrap();
        let config = ConfigBuilder::new()
            .with_working_dir(temp.path())
            .with_workspace_dir(temp.path())
            .skip_env()
            .build()
            .unwrap();

        assert_eq!(config.workspace_dir.as_deref(), Some(temp.path()));
        assert_eq!(config.database_path(), Some(temp.path().join("index.db")));
        assert_eq!(config.output_format, Some(OutputFormat::Json));
        assert_eq!(config.log_mode, Some(LogLevel::Normal));
        assert!(!config.include_status());
        let checker = config.checker.unwrap();
        assert_eq!(checker.verify_hash, Some(true));
        assert_eq!(checker.trash_dirs, Some(vec![PathBuf::from(".trash")]));
    }

    #[test]
    fn test_file_precedence() {
        let workspace = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        fs::write(
            workspace.path().join("config.yaml"),
            "output_format: human\nchecker:\n  timeout_ms: 100\n",
        )
        .unwrap();
        fs::write(project.path().join("pkms.yaml"), "checker:\n  timeout_ms: 200\n").unwrap();
        fs::write(
            project.path().join("pkms.local.yaml"),
            "resolve:\n  include_status: true\n",
        )
        .unwrap();

        let config = ConfigBuilder::new()
            .with_working_dir(project.path())
            .with_workspace_dir(workspace.path())
            .skip_env()
            .build()
            .unwrap();

        assert_eq!(config.output_format, Some(OutputFormat::Human));
        assert_eq!(config.check_timeout(), Some(std::time::Duration::from_millis(200)));
        assert!(config.include_status());
        assert_eq!(config.checker.unwrap().verify_hash, Some(true));
    }

    #[test]
    fn test_overrides_beat_files() {
        let project = TempDir::new().unwrap();
        fs::write(project.path().join("pkms.yaml"), "output_format: human\n").unwrap();

        let config = ConfigBuilder::new()
            .with_working_dir(project.path())
            .with_workspace_dir(project.path())
            .skip_env()
            .with_config(Config {
                output_format: Some(OutputFormat::Json),
                ..Default::default()
            })
            .build()
            .unwrap();
        assert_eq!(config.output_format, Some(OutputFormat::Json));
    }

    #[test]
    fn test_project_file_may_name_workspace() {
        let project = TempDir::new().unwrap();
        fs::write(project.path().join("pkms.yaml"), "workspace_dir: /srv/pkms\n").unwrap();

        let config = ConfigBuilder::new()
            .with_working_dir(project.path())
            .skip_env()
            .build()
            .unwrap();
        assert_eq!(config.workspace_dir, Some(PathBuf::from("/srv/pkms")));
    }

    #[test]
    fn test_invalid_merged_config_is_rejected() {
        let result = ConfigBuilder::new()
            .skip_files()
            .skip_env()
            .with_config(Config {
                checker: Some(CheckerConfig {
                    timeout_ms: Some(0),
                    ..Default::default()
                }),
                ..Default::default()
            })
            .build();
        assert!(matches!(result, Err(Error::Validation { .. })));
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let project = TempDir::new().unwrap();
        fs::write(project.path().join("pkms.yaml"), "no_such_key: 1\n").unwrap();

        let result = ConfigBuilder::new()
            .with_working_dir(project.path())
            .with_workspace_dir(project.path())
            .skip_env()
            .build();
        assert!(result.is_err());
    }
}
