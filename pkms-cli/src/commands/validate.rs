//! Command to validate a pkms configuration file.

use crate::error::CliError;
use crate::utils::GlobalOptions;
use clap::Args;
use pkms::config::loader::{LOCAL_CONFIG_FILE, PROJECT_CONFIG_FILE, WORKSPACE_CONFIG_FILE};
use pkms::config::{ConfigLoader, ConfigValidator};
use std::path::{Path, PathBuf};

/// Validate a pkms configuration file.
#[derive(Args)]
pub struct ValidateCommand {
    /// Configuration file to validate
    #[arg(value_name = "CONFIG_PATH")]
    pub config_path: PathBuf,
}

/// Which layer a file name belongs to.
fn layer_of(path: &Path) -> &'static str {
    match path.file_name().and_then(|name| name.to_str()) {
        Some(WORKSPACE_CONFIG_FILE) => "workspace",
        Some(PROJECT_CONFIG_FILE) => "project",
        Some(LOCAL_CONFIG_FILE) => "local project",
        _ => "standalone",
    }
}

impl ValidateCommand {
    /// Execute the validate command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        if !self.config_path.is_file() {
            return Err(CliError::InvalidArguments(format!(
                "File not found: {}",
                self.config_path.display()
            )));
        }

        // Unknown keys and malformed values fail here, before field checks
        let config = ConfigLoader::load_file(&self.config_path).map_err(|e| {
            eprintln!("Parse error: {e}");
            CliError::SemanticFailure("Configuration file is invalid".to_string())
        })?;

        ConfigValidator::validate(&config).map_err(|e| {
            eprintln!("Validation error: {e}");
            CliError::SemanticFailure("Configuration validation failed".to_string())
        })?;

        if !global.quiet {
            println!(
                "Configuration is valid ({} layer)",
                layer_of(&self.config_path)
            );
        }
        Ok(())
    }
}
