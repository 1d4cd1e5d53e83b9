//! CLI command implementations.
//!
//! - `resolve`: Resolve a logical reference against the index
//! - `parse_location`: Print the structured form of a location URI
//! - `project`: Project a location onto a filesystem path, or import one
//! - `init`: Create the workspace and index database
//! - `show_workspace`: Show the resolved workspace directory
//! - `validate`: Validate a configuration file
//! - `completions`: Generate shell completion scripts

pub mod completions;
pub mod init;
pub mod parse_location;
pub mod project;
pub mod resolve;
pub mod show_workspace;
pub mod validate;

pub use completions::CompletionsCommand;
pub use init::InitCommand;
pub use parse_location::ParseLocationCommand;
pub use project::ProjectCommand;
pub use resolve::ResolveCommand;
pub use show_workspace::ShowWorkspaceCommand;
pub use validate::ValidateCommand;
