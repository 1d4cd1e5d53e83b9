//! Command to show the resolved workspace directory.

use crate::error::CliError;
use crate::utils::{load_configuration, GlobalOptions};
use clap::Args;

/// Show the resolved workspace directory.
#[derive(Args)]
pub struct ShowWorkspaceCommand {
    /// Print the index database path instead
    #[arg(long)]
    pub database: bool,
}

impl ShowWorkspaceCommand {
    /// Execute the show-workspace command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = load_configuration(global)?;
        let path = if self.database {
            config.database_path()
        } else {
            config.workspace_dir
        };
        let path = path.ok_or_else(|| {
            CliError::Config(
                "Could not determine workspace directory (home directory not found)".to_string(),
            )
        })?;
        println!("{}", path.display());
        Ok(())
    }
}
