//! CLI structure and command definitions.
//!
//! This module defines the main CLI structure using clap's derive macros,
//! including global options and subcommands.

use crate::commands::{
    CompletionsCommand, InitCommand, ParseLocationCommand, ProjectCommand, ResolveCommand,
    ShowWorkspaceCommand, ValidateCommand,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line tool for resolving pkms references and file locations.
#[derive(Parser)]
#[command(name = "pkms")]
#[command(version, about = "Resolve pkms references and file locations", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Override the workspace directory location
    #[arg(long, value_name = "PATH", global = true, env = "PKMS_WORKSPACE_DIR")]
    pub workspace_dir: Option<PathBuf>,

    /// Override the index busy timeout (in milliseconds)
    #[arg(long, value_name = "MILLIS", global = true)]
    pub busy_timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand)]
pub enum Command {
    /// Resolve a logical reference against the index
    Resolve(ResolveCommand),

    /// Parse a location URI and print its structure
    ParseLocation(ParseLocationCommand),

    /// Project a location URI onto a filesystem path (or back)
    Project(ProjectCommand),

    /// Initialize the workspace and index database
    Init(InitCommand),

    /// Show the resolved workspace directory
    ShowWorkspace(ShowWorkspaceCommand),

    /// Validate a configuration file
    Validate(ValidateCommand),

    /// Generate shell completion scripts
    Completions(CompletionsCommand),
}
