//! CLI-specific error types with exit codes.
//!
//! This module defines error types specific to the CLI layer,
//! wrapping library errors and providing appropriate exit codes.

use std::fmt;
use std::path::PathBuf;

use pkms::{Error as LibError, ResolverError};

/// CLI-specific error type with exit code mapping.
#[derive(Debug)]
pub enum CliError {
    /// Library error (wrapped).
    Library(LibError),

    /// Malformed reference, URI, path, or argument.
    InvalidArguments(String),

    /// I/O error.
    Io(std::io::Error),

    /// A collaborator (index lock or existence check) timed out.
    Timeout(String),

    /// The index database does not exist.
    NoWorkspace(PathBuf),

    /// Configuration error.
    Config(String),

    /// Semantic failure (e.g., a validated file is invalid).
    SemanticFailure(String),
}

impl CliError {
    /// Get the appropriate exit code for this error.
    ///
    /// Exit codes:
    /// - 0: Success, whatever the resolution outcome
    /// - 1: Semantic failure
    /// - 2: Timeout
    /// - 3: Workspace or index database not found
    /// - 4: Invalid arguments
    /// - 5: I/O error
    /// - 6: Other library error
    /// - 7: Configuration error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::SemanticFailure(_) => 1,
            CliError::Timeout(_) => 2,
            CliError::NoWorkspace(_) => 3,
            CliError::InvalidArguments(_) => 4,
            CliError::Io(_) => 5,
            CliError::Library(_) => 6,
            CliError::Config(_) => 7,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Library(e) => write!(f, "{e}"),
            CliError::InvalidArguments(msg) => write!(f, "Invalid arguments: {msg}"),
            CliError::Io(e) => write!(f, "I/O error: {e}"),
            CliError::Timeout(msg) => write!(f, "Timed out: {msg}"),
            CliError::NoWorkspace(path) => {
                write!(
                    f,
                    "Index database not found at {} (run `pkms init` or use --workspace-dir)",
                    path.display()
                )
            }
            CliError::Config(msg) => write!(f, "Configuration error: {msg}"),
            CliError::SemanticFailure(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Library(e) => Some(e),
            CliError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LibError> for CliError {
    fn from(e: LibError) -> Self {
        if e.is_timeout() {
            CliError::Timeout(e.to_string())
        } else if e.is_invalid_input() {
            CliError::InvalidArguments(e.to_string())
        } else if let LibError::WorkspaceNotFound { path } = e {
            CliError::NoWorkspace(path)
        } else {
            CliError::Library(e)
        }
    }
}

impl From<ResolverError> for CliError {
    fn from(e: ResolverError) -> Self {
        LibError::from(e).into()
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}
