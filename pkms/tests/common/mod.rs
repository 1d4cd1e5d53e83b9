//! Common test utilities for integration tests.
//!
//! [`VaultFixture`] lays out a temporary vault directory next to an index
//! database, so tests can write notes, record them, and resolve them
//! through the real `SQLite` store and filesystem checker.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use pkms::database::{Database, DatabaseConfig};
use pkms::identity::{Capability, ContentHash, FileId, FileUid, Identity, Revision, RevisionId};
use pkms::location::{FileLocation, PathTarget};
use pkms::resolver::{sha256_file, FilesystemCheckConfig, FilesystemChecker, Resolver};
use pkms::SqliteIdentityStore;

/// A temporary workspace holding `vault/` and `index.db`.
#[allow(dead_code)]
pub struct VaultFixture {
    dir: TempDir,
}

#[allow(dead_code)]
impl VaultFixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("vault")).unwrap();
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn vault(&self) -> PathBuf {
        self.dir.path().join("vault")
    }

    pub fn db_path(&self) -> PathBuf {
        self.dir.path().join("index.db")
    }

    /// Path of a vault-relative file.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.vault().join(relative)
    }

    /// Writes a vault file, creating parent directories.
    pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.path(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    pub fn open_db(&self) -> Database {
        Database::open(DatabaseConfig::new(self.db_path())).unwrap()
    }

    /// A resolver over a read-only connection to the index.
    pub fn resolver(&self, vault_roots: bool) -> Resolver<SqliteIdentityStore, FilesystemChecker> {
        let store =
            SqliteIdentityStore::open_read_only(DatabaseConfig::new(self.db_path())).unwrap();
        let config = FilesystemCheckConfig {
            vault_roots: if vault_roots { vec![self.vault()] } else { Vec::new() },
            ..FilesystemCheckConfig::default()
        };
        Resolver::new(store, FilesystemChecker::new(config))
    }
}

/// The `file` location of a local path.
#[allow(dead_code)]
pub fn location_of(path: &Path) -> FileLocation {
    FileLocation::from_filesystem_path(path.to_str().unwrap(), PathTarget::Posix).unwrap()
}

/// SHA-256 of a local file.
#[allow(dead_code)]
pub fn hash_of(path: &Path) -> ContentHash {
    ContentHash::new(&sha256_file(path).unwrap()).unwrap()
}

/// A revision capturing the current bytes of `path`.
#[allow(dead_code)]
pub fn capture(revision_id: &str, path: &Path) -> Revision {
    Revision::builder(
        RevisionId::new(revision_id).unwrap(),
        hash_of(path),
        location_of(path),
    )
    .size(fs::metadata(path).unwrap().len())
    .metadata("source", "fixture")
    .build()
    .unwrap()
}

/// Registers an identity with optional uid and capabilities.
#[allow(dead_code)]
pub fn register(
    db: &mut Database,
    file_id: &str,
    extension: Option<&str>,
    uid: Option<&str>,
    capabilities: &[&str],
) -> Identity {
    let uid = uid.map(|uid| FileUid::new(uid).unwrap());
    let capabilities: BTreeSet<Capability> = capabilities
        .iter()
        .map(|name| Capability::new(name).unwrap())
        .collect();
    db.register_identity(&FileId::new(file_id).unwrap(), extension, uid.as_ref(), &capabilities)
        .unwrap()
}
