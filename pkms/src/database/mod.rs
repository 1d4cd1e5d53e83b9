//! `SQLite` index of identities, revisions, and HEAD pointers.
//!
//! Ingestion writes through [`Database`]; the resolver reads through
//! [`SqliteIdentityStore`], which adapts the index to
//! [`IdentityStore`](crate::identity::IdentityStore).
//!
//! # Examples
//!
//! ```no_run
//! use std::collections::BTreeSet;
//!
//! use pkms::database::{Database, DatabaseConfig};
//! use pkms::identity::{ContentHash, FileId, Revision, RevisionId};
//! use pkms::location::FileLocation;
//!
//! let mut db = Database::open(DatabaseConfig::new("/tmp/index.db")).unwrap();
//! let identity = db
//!     .register_identity(&FileId::new("2024-01-01-0001").unwrap(), Some(".md"), None, &BTreeSet::new())
//!     .unwrap();
//!
//! let revision = Revision::builder(
//!     RevisionId::new("r1").unwrap(),
//!     ContentHash::new("deadbeef").unwrap(),
//!     FileLocation::from_uri("file:///vault/2024-01-01-0001.md").unwrap(),
//! )
//! .build()
//! .unwrap();
//! db.append_revision(identity.seq_id(), &revision).unwrap();
//! db.set_head(identity.seq_id(), revision.revision_id()).unwrap();
//! ```

mod config;
mod connection;
mod ingest;
pub mod migrations;
mod operations;
mod schema;
mod store;
#[cfg(test)]
pub(crate) mod test_util;

pub use config::{
    default_workspace_dir, resolve_database_path, resolve_workspace_dir, DatabaseConfig,
    WORKSPACE_DIR_NAME,
};
pub use connection::Database;
pub use store::SqliteIdentityStore;

pub use migrations::{check_schema_compatibility, get_schema_version, initialize_schema};
