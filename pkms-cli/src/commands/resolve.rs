//! Resolve command implementation.
//!
//! Every resolution outcome, including `NOT_FOUND`, is printed and exits 0.
//! Only malformed references and collaborator failures are errors.

use crate::error::CliError;
use crate::utils::{checker_config, load_configuration, open_store, GlobalOptions};
use clap::{ArgGroup, Args};
use pkms::config::OutputFormat;
use pkms::resolver::{ExistenceChecker, TimeoutChecker};
use pkms::{
    FilesystemChecker, Reference, ResolveOptions, ResolvedTarget, Resolver, SqliteIdentityStore,
};

/// Resolve a logical reference against the index.
#[derive(Args)]
#[command(group(
    ArgGroup::new("reference")
        .required(true)
        .args(["uri", "selector"])
))]
pub struct ResolveCommand {
    /// Logical reference, e.g. `pkms:///file/id:2024-01-01-0001.md`
    #[arg(value_name = "URI")]
    pub uri: Option<String>,

    /// Selector name (id, uid or sha256)
    #[arg(long, value_name = "SELECTOR", requires = "value")]
    pub selector: Option<String>,

    /// Selector value
    #[arg(long, value_name = "VALUE", requires = "selector")]
    pub value: Option<String>,

    /// File extension, with or without the leading dot
    #[arg(long, value_name = "EXT", requires = "selector")]
    pub ext: Option<String>,

    /// Include the lifecycle status in the response
    #[arg(long)]
    pub status: bool,

    /// Output format (json or human)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,
}

impl ResolveCommand {
    /// Execute the resolve command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let reference = self.reference()?;
        let config = load_configuration(global)?;
        let options = ResolveOptions {
            include_status: self.status || config.include_status(),
        };

        let store = open_store(&config)?;
        let checker = FilesystemChecker::new(checker_config(&config));
        let target = match config.check_timeout() {
            Some(timeout) => {
                log::debug!("existence checks limited to {timeout:?}");
                let checker = TimeoutChecker::new(checker, timeout);
                resolve(store, checker, &reference, options)?
            }
            None => resolve(store, checker, &reference, options)?,
        };

        let format = self.format.or(config.output_format).unwrap_or_default();
        let output = format.create_formatter().format_resolution(&target)?;
        println!("{output}");
        Ok(())
    }

    /// The reference named by the positional URI or the selector flags.
    fn reference(&self) -> Result<Reference, CliError> {
        match (&self.uri, &self.selector, &self.value) {
            (Some(uri), _, _) => Ok(Reference::parse_uri(uri)?),
            (None, Some(selector), Some(value)) => {
                Ok(Reference::new(selector, value, self.ext.as_deref())?)
            }
            _ => Err(CliError::InvalidArguments(
                "either a URI or --selector with --value is required".to_string(),
            )),
        }
    }
}

fn resolve<C: ExistenceChecker>(
    store: SqliteIdentityStore,
    checker: C,
    reference: &Reference,
    options: ResolveOptions,
) -> Result<ResolvedTarget, CliError> {
    let resolver = Resolver::new(store, checker);
    Ok(resolver.resolve_with(reference, options)?)
}
