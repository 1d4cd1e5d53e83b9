//! Configuration system for pkms.
//!
//! This module provides hierarchical configuration with support for:
//! - YAML configuration files (workspace config and project files)
//! - Environment variable overrides
//! - Programmatic configuration via builder pattern
//! - Validation
//!
//! # Configuration Precedence
//!
//! Configuration is merged from multiple sources with the following precedence
//! (highest to lowest):
//!
//! 1. Programmatic overrides (via `ConfigBuilder::with_config`)
//! 2. Environment variables (`PKMS_*`)
//! 3. Private project config (`pkms.local.yaml`)
//! 4. Project config (`pkms.yaml`)
//! 5. Workspace config (`~/.pkms/config.yaml`)
//! 6. Built-in defaults
//!
//! # Examples
//!
//! ```no_run
//! use pkms::config::ConfigBuilder;
//! use std::path::Path;
//!
//! let config = ConfigBuilder::new()
//!     .with_working_dir(Path::new("/path/to/vault"))
//!     .build()
//!     .unwrap();
//!
//! println!("index: {:?}", config.database_path());
//! ```

pub mod builder;
pub mod environment;
pub mod loader;
pub mod merger;
pub mod schema;
pub mod validator;

#[cfg(all(test, feature = "property-tests"))]
mod proptests;

pub use builder::ConfigBuilder;
pub use environment::EnvironmentConfig;
pub use loader::{ConfigLoader, ConfigSource};
pub use merger::ConfigMerger;
pub use schema::{CheckerConfig, Config, DatabaseSettings, OutputFormat, ResolveConfig};
pub use validator::ConfigValidator;
