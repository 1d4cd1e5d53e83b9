//! Shared fixtures for database unit tests.

use tempfile::tempdir;

use crate::database::{Database, DatabaseConfig};
use crate::identity::{ContentHash, Revision, RevisionId};
use crate::location::FileLocation;

/// File id used by most fixtures.
pub const NOTE: &str = "2024-01-01-0001";

/// Creates a file-backed test database that lives for the whole test run.
///
/// # Panics
///
/// Panics if the temporary directory or database cannot be created.
#[must_use]
pub fn create_test_database() -> Database {
    let dir = tempdir().unwrap();
    let path = dir.path().join("index.db");
    let db = Database::open(DatabaseConfig::new(path)).unwrap();

    // Keep the directory alive for the connection.
    std::mem::forget(dir);

    db
}

/// A revision of [`NOTE`] stored under `/vault/journal`.
///
/// # Panics
///
/// Panics if the id or hash is malformed.
#[must_use]
pub fn revision(revision_id: &str, content_hash: &str) -> Revision {
    Revision::builder(
        RevisionId::new(revision_id).unwrap(),
        ContentHash::new(content_hash).unwrap(),
        FileLocation::from_uri(&format!("file:///vault/journal/{NOTE}.md")).unwrap(),
    )
    .size(42)
    .build()
    .unwrap()
}
