//! Output formatting for resolution responses and parsed locations.
//!
//! JSON output is the wire shape of the response; human output is a
//! line-per-field summary for terminals.

mod formatters;

use crate::config::OutputFormat;
use crate::location::FileLocation;
use crate::resolver::ResolvedTarget;
use crate::Result;

pub use formatters::{HumanFormatter, JsonFormatter};

/// Trait for rendering command results in one output format.
pub trait OutputFormatter {
    /// Renders a resolver response.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn format_resolution(&self, target: &ResolvedTarget) -> Result<String>;

    /// Renders a parsed location.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn format_location(&self, location: &FileLocation) -> Result<String>;
}

impl OutputFormat {
    /// Create a formatter for this output format.
    #[must_use]
    pub fn create_formatter(self) -> Box<dyn OutputFormatter> {
        match self {
            Self::Json => Box::new(JsonFormatter),
            Self::Human => Box::new(HumanFormatter),
        }
    }
}
