#![deny(missing_docs, unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! # pkms
//!
//! Addressing and resolution for a personal knowledge management system.
//!
//! A file is named two ways: by where it is, a canonical [`FileLocation`]
//! `(scheme, authority, segments)`, and by what it is, a logical
//! [`Reference`] such as `pkms:///file/id:2024-01-01-0001.md`. The
//! [`Resolver`] turns a reference into a [`ResolvedTarget`] by reading
//! identity records and asking an existence checker about the bytes.
//!
//! ## Core Types
//!
//! - [`PathSegments`] and [`FileLocation`]: lossless location values
//! - [`Reference`] and [`Selector`]: logical references
//! - [`Identity`], [`Revision`], [`Head`]: records owned by ingestion
//! - [`Resolver`], [`ResolvedTarget`], [`Outcome`]: graded resolution
//! - [`Database`] and [`SqliteIdentityStore`]: the `SQLite` index
//! - [`Error`] and [`Result`]: Error handling types
//! - [`Logger`] and [`LogLevel`]: Logging infrastructure
//!
//! ## Examples
//!
//! ```
//! use pkms::location::FileLocation;
//!
//! let location = FileLocation::from_uri("file:///vault/a%20b.md").unwrap();
//! assert_eq!(location.authority(), Some(""));
//! assert_eq!(location.segments().names(), ["vault", "a b.md"]);
//! assert_eq!(location.to_uri(), "file:///vault/a%20b.md");
//! ```
//!
//! ```
//! use pkms::identity::{ContentHash, FileId, MemoryIdentityStore, Revision, RevisionId};
//! use pkms::location::FileLocation;
//! use pkms::resolver::{CheckReport, Outcome, Resolver, ScriptedChecker};
//!
//! let store = MemoryIdentityStore::new();
//! let identity = store
//!     .register(FileId::new("2024-01-01-0001").unwrap(), Some(".md"), None, [])
//!     .unwrap();
//! let location = FileLocation::from_uri("file:///vault/2024-01-01-0001.md").unwrap();
//! let hash = ContentHash::new("deadbeef").unwrap();
//! let revision = Revision::builder(RevisionId::new("r1").unwrap(), hash.clone(), location.clone())
//!     .build()
//!     .unwrap();
//! store.append_revision(identity.seq_id(), revision).unwrap();
//!
//! let checker = ScriptedChecker::new().with_report(location, CheckReport::matching(hash));
//! let resolver = Resolver::new(store, checker);
//! let target = resolver.resolve("id", "2024-01-01-0001", Some(".md")).unwrap();
//! assert_eq!(target.outcome, Outcome::ResolvedCurrent);
//! ```

pub mod config;
pub mod database;
pub mod error;
pub mod identity;
pub mod location;
pub mod logging;
pub mod output;
pub mod resolver;
pub mod selector;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigBuilder, OutputFormat};
pub use database::{Database, DatabaseConfig, SqliteIdentityStore};
pub use error::{
    CollaboratorError, ConstructionError, Error, ParseError, ProjectionError, ResolveStep,
    ResolverError, Result,
};
pub use identity::{
    Capability, ContentHash, FileId, FileUid, Head, Identity, IdentityStore, MemoryIdentityStore,
    Revision, RevisionId, SeqId,
};
pub use location::{FileLocation, LocationMatcher, PathSegments, PathTarget};
pub use logging::{init_logger, init_logger_with_config, LogLevel, Logger};
pub use resolver::{
    Currency, ExistenceChecker, FilesystemChecker, Outcome, ResolutionStatus, ResolveOptions,
    ResolvedTarget, Resolver,
};
pub use selector::{Reference, Selector};
