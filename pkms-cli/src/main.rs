//! Main entry point for the pkms CLI.
//!
//! This is the command-line interface for pkms addressing and resolution.
//! It provides commands for:
//! - `resolve`: Resolve a logical reference to its best-known facts
//! - `parse-location`: Show the structure of a location URI
//! - `project`: Convert between location URIs and filesystem paths
//! - `init`: Create the workspace and index database

mod cli;
mod commands;
mod error;
mod utils;

use clap::Parser;
use cli::Cli;
use utils::GlobalOptions;

fn main() {
    let cli = Cli::parse();

    let global = GlobalOptions {
        verbose: cli.verbose,
        quiet: cli.quiet,
        workspace_dir: cli.workspace_dir,
        busy_timeout: cli.busy_timeout,
    };

    // Commands report configuration errors themselves
    let configured = utils::configured_log_mode(&global);
    let _logger = pkms::init_logger_with_config(global.verbose, global.quiet, configured);

    let result = match cli.command {
        cli::Command::Resolve(cmd) => cmd.execute(&global),
        cli::Command::ParseLocation(cmd) => cmd.execute(&global),
        cli::Command::Project(cmd) => cmd.execute(&global),
        cli::Command::Init(cmd) => cmd.execute(&global),
        cli::Command::ShowWorkspace(cmd) => cmd.execute(&global),
        cli::Command::Validate(cmd) => cmd.execute(&global),
        cli::Command::Completions(cmd) => cmd.execute(&global),
    };

    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
