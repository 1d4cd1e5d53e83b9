//! Init command implementation.
//!
//! This module implements the `init` command for explicitly creating the
//! pkms workspace directory and its index database.

use crate::error::CliError;
use crate::utils::{load_configuration, shorten_path, workspace_dir, GlobalOptions};
use clap::Parser;
use pkms::config::loader::WORKSPACE_CONFIG_FILE;
use pkms::{Database, DatabaseConfig};
use std::fs;

/// Default workspace configuration written by `init --with-config`.
const DEFAULT_CONFIG_TEMPLATE: &str = r"# pkms workspace configuration
# Project files (pkms.yaml, pkms.local.yaml) and PKMS_* variables override it.

output_format: json

# database:
#   file_name: index.db
#   busy_timeout_ms: 5000

# checker:
#   verify_hash: true
#   trash_dirs: [.trash]
#   vault_roots: []
#   timeout_ms: 2000

# resolve:
#   include_status: false
";

/// Initialize the pkms workspace and index database.
#[derive(Parser)]
#[command(about = "Initialize the pkms workspace and index database")]
pub struct InitCommand {
    /// Create a default configuration file
    #[arg(long)]
    with_config: bool,

    /// Preview actions without executing
    #[arg(long)]
    dry_run: bool,
}

impl InitCommand {
    /// Execute the init command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let dir = workspace_dir(global)?;
        let config_path = dir.join(WORKSPACE_CONFIG_FILE);

        if self.dry_run {
            println!("Dry-run mode: no changes will be made");
            println!();
            println!("Would initialize pkms in: {}", shorten_path(&dir));
            if dir.exists() {
                println!("  - Workspace directory already exists");
            } else {
                println!("  - Create workspace directory");
            }
            if self.with_config && !config_path.exists() {
                println!("  - Create configuration file: {}", config_path.display());
            }
            return Ok(());
        }

        let dir_created = !dir.exists();
        fs::create_dir_all(&dir)?;

        let config_created = self.with_config && !config_path.exists();
        if config_created {
            fs::write(&config_path, DEFAULT_CONFIG_TEMPLATE)?;
        }

        let global = GlobalOptions {
            workspace_dir: Some(dir.clone()),
            ..global.clone()
        };
        let config = load_configuration(&global)?;
        let db_config =
            DatabaseConfig::from_config(&config).map_err(|e| CliError::Config(e.to_string()))?;
        let database_created = !db_config.path.exists();
        let db_path = db_config.path.clone();
        Database::open(db_config)?;

        if global.quiet {
            return Ok(());
        }

        println!("Initialized pkms in: {}", shorten_path(&dir));
        if dir_created {
            println!("  - Created workspace directory");
        }
        if database_created {
            println!("  - Created index database: {}", db_path.display());
        } else {
            println!("  - Index database already exists: {}", db_path.display());
        }
        if config_created {
            println!("  - Created default configuration file");
        } else if self.with_config {
            println!("  - Configuration file already exists (not overwritten)");
        }

        Ok(())
    }
}
