//! Command to convert between location URIs and filesystem paths.

use crate::error::CliError;
use crate::utils::GlobalOptions;
use clap::Args;
use pkms::{FileLocation, PathTarget};

/// Project a location onto a filesystem path, or import a path as a location.
#[derive(Args)]
pub struct ProjectCommand {
    /// Location URI (or a filesystem path with --from-path)
    #[arg(value_name = "INPUT")]
    pub input: String,

    /// Path convention (posix or windows); defaults to this platform's
    #[arg(long, value_name = "TARGET")]
    pub target: Option<PathTarget>,

    /// Treat INPUT as a filesystem path and print its `file` URI
    #[arg(long)]
    pub from_path: bool,
}

impl ProjectCommand {
    /// Execute the project command.
    pub fn execute(self, _global: &GlobalOptions) -> Result<(), CliError> {
        let target = self.target.unwrap_or_else(PathTarget::native);

        let output = if self.from_path {
            FileLocation::from_filesystem_path(&self.input, target)
                .map_err(pkms::Error::from)?
                .to_uri()
        } else {
            FileLocation::from_uri(&self.input)
                .map_err(pkms::Error::from)?
                .to_filesystem_path(target)
                .map_err(pkms::Error::from)?
        };

        println!("{output}");
        Ok(())
    }
}
