//! Logging infrastructure for the pkms library.
//!
//! Library code logs through the `log` facade. [`Logger`] is the stderr
//! sink the CLI installs; its verbosity comes from flags, then
//! `PKMS_LOG_MODE`, then the configured `log_mode`.

use std::env;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::environment::ENV_LOG_MODE;

/// Logging level for controlling output verbosity.
///
/// Log levels are ordered from least verbose (Quiet) to most verbose (Verbose).
///
/// # Examples
///
/// ```
/// use pkms::LogLevel;
///
/// assert!(LogLevel::Quiet < LogLevel::Normal);
/// assert!(LogLevel::Normal < LogLevel::Verbose);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Suppress all non-essential output.
    Quiet,
    /// Normal output level (errors and warnings).
    Normal,
    /// Verbose output (errors, warnings, info, and debug messages).
    Verbose,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quiet => write!(f, "quiet"),
            Self::Normal => write!(f, "normal"),
            Self::Verbose => write!(f, "verbose"),
        }
    }
}

impl LogLevel {
    /// Parses a log level from a string.
    ///
    /// Recognizes: "quiet", "normal", "verbose" (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not recognized.
    ///
    /// # Examples
    ///
    /// ```
    /// use pkms::LogLevel;
    ///
    /// assert_eq!(LogLevel::parse("VERBOSE").unwrap(), LogLevel::Verbose);
    /// assert!(LogLevel::parse("chatty").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "quiet" => Ok(Self::Quiet),
            "normal" => Ok(Self::Normal),
            "verbose" => Ok(Self::Verbose),
            _ => Err(format!("invalid log level: {s}")),
        }
    }

    /// The `log` filter this level lets through.
    #[must_use]
    pub const fn to_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Quiet => log::LevelFilter::Off,
            Self::Normal => log::LevelFilter::Warn,
            Self::Verbose => log::LevelFilter::Debug,
        }
    }
}

/// A stderr logger.
///
/// Messages below the configured level are dropped. The same filter
/// applies to the direct methods and to records arriving through the
/// `log` facade once [`Logger::install`] has run.
///
/// # Examples
///
/// ```
/// use pkms::{Logger, LogLevel};
///
/// let logger = Logger::new(LogLevel::Normal);
/// logger.warn("index is read-only");
/// logger.info("not printed at Normal");
/// ```
#[derive(Debug)]
pub struct Logger {
    level: LogLevel,
}

impl Logger {
    /// Creates a new logger with the specified log level.
    #[must_use]
    pub const fn new(level: LogLevel) -> Self {
        Self { level }
    }

    /// Returns the current log level.
    #[must_use]
    pub const fn level(&self) -> LogLevel {
        self.level
    }

    fn emit(&self, level: log::Level, message: &dyn fmt::Display) {
        if level <= self.level.to_level_filter() {
            eprintln!("{}: {message}", level.as_str());
        }
    }

    /// Logs an error message. Shown unless the level is Quiet.
    pub fn error(&self, message: &str) {
        self.emit(log::Level::Error, &message);
    }

    /// Logs a warning message. Shown at Normal and Verbose.
    pub fn warn(&self, message: &str) {
        self.emit(log::Level::Warn, &message);
    }

    /// Logs an informational message. Shown at Verbose only.
    pub fn info(&self, message: &str) {
        self.emit(log::Level::Info, &message);
    }

    /// Logs a debug message. Shown at Verbose only.
    pub fn debug(&self, message: &str) {
        self.emit(log::Level::Debug, &message);
    }

    /// Installs this logger as the process-wide `log` sink.
    ///
    /// Only the first installation in a process takes effect.
    ///
    /// # Errors
    ///
    /// Returns an error if a logger is already installed.
    pub fn install(self) -> Result<(), log::SetLoggerError> {
        let filter = self.level.to_level_filter();
        log::set_logger(Box::leak(Box::new(self)))?;
        log::set_max_level(filter);
        Ok(())
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(LogLevel::Normal)
    }
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= self.level.to_level_filter()
    }

    fn log(&self, record: &log::Record<'_>) {
        self.emit(record.level(), record.args());
    }

    fn flush(&self) {}
}

fn select_level(verbose: bool, quiet: bool, configured: Option<LogLevel>) -> LogLevel {
    if verbose {
        return LogLevel::Verbose;
    }
    if quiet {
        return LogLevel::Quiet;
    }

    env::var(ENV_LOG_MODE)
        .ok()
        .and_then(|value| LogLevel::parse(&value).ok())
        .or(configured)
        .unwrap_or(LogLevel::Normal)
}

/// Initializes a logger based on environment variables and CLI flags.
///
/// The priority order is:
/// 1. CLI flags (verbose/quiet)
/// 2. `PKMS_LOG_MODE` environment variable
/// 3. Default (Normal)
///
/// If both `verbose` and `quiet` are true, `verbose` takes precedence.
/// The first call also installs a logger of that level as the global `log`
/// backend; later calls only return a logger.
///
/// # Examples
///
/// ```
/// use pkms::{init_logger, LogLevel};
///
/// assert_eq!(init_logger(true, false).level(), LogLevel::Verbose);
/// assert_eq!(init_logger(false, true).level(), LogLevel::Quiet);
/// ```
#[must_use]
pub fn init_logger(verbose: bool, quiet: bool) -> Logger {
    init_logger_with_config(verbose, quiet, None)
}

/// Like [`init_logger`], falling back to the configured `log_mode` when
/// neither a flag nor `PKMS_LOG_MODE` decides the level.
#[must_use]
pub fn init_logger_with_config(verbose: bool, quiet: bool, configured: Option<LogLevel>) -> Logger {
    let level = select_level(verbose, quiet, configured);
    if Logger::new(level).install().is_err() {
        log::debug!("global logger already installed");
    }
    Logger::new(level)
}
