//! Command to print the structured form of a location URI.

use crate::error::CliError;
use crate::utils::GlobalOptions;
use clap::Args;
use pkms::config::OutputFormat;
use pkms::FileLocation;

/// Parse a location URI and print its scheme, authority and segments.
#[derive(Args)]
pub struct ParseLocationCommand {
    /// Location URI, e.g. `file:///vault/a%20b.md`
    #[arg(value_name = "URI")]
    pub uri: String,

    /// Output format (json or human)
    #[arg(long, value_name = "FORMAT", default_value = "json")]
    pub format: OutputFormat,
}

impl ParseLocationCommand {
    /// Execute the parse-location command.
    pub fn execute(self, _global: &GlobalOptions) -> Result<(), CliError> {
        let location = FileLocation::from_uri(&self.uri).map_err(pkms::Error::from)?;
        let output = self.format.create_formatter().format_location(&location)?;
        println!("{output}");
        Ok(())
    }
}
