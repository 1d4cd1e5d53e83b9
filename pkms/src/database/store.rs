//! [`IdentityStore`] backed by the `SQLite` index.

use std::sync::{Mutex, MutexGuard};

use crate::error::{CollaboratorError, Error, Result};
use crate::identity::{Identity, IdentityStore, Revision};
use crate::selector::Reference;

use super::config::DatabaseConfig;
use super::connection::Database;

const COLLABORATOR: &str = "identity store";

/// Serves resolver reads from an index database.
///
/// The connection sits behind a mutex, so concurrent resolutions through
/// one store take turns. Open one store per thread for parallel reads.
#[derive(Debug)]
pub struct SqliteIdentityStore {
    db: Mutex<Database>,
}

impl SqliteIdentityStore {
    /// Wraps an open database.
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }

    /// Opens the index read-only.
    ///
    /// # Errors
    ///
    /// Returns `WorkspaceNotFound` if the index file does not exist, or a
    /// schema error if it was written by an incompatible version.
    pub fn open_read_only(config: DatabaseConfig) -> Result<Self> {
        Ok(Self::new(Database::open(config.read_only())?))
    }

    /// Gives the database back.
    ///
    /// # Errors
    ///
    /// Returns an error if a reader panicked while holding the connection.
    pub fn into_inner(self) -> Result<Database> {
        self.db.into_inner().map_err(|_| poisoned())
    }

    fn lock(&self) -> std::result::Result<MutexGuard<'_, Database>, CollaboratorError> {
        self.db.lock().map_err(|_| CollaboratorError::Unavailable {
            collaborator: COLLABORATOR,
            reason: "connection lock poisoned".into(),
        })
    }
}

fn poisoned() -> Error {
    Error::DatabaseCorruption {
        details: "connection lock poisoned".into(),
    }
}

/// Maps an index failure onto the collaborator taxonomy. Lock contention
/// that outlived the busy timeout becomes a timeout of that length.
fn to_collaborator(db: &Database, err: Error) -> CollaboratorError {
    match err {
        Error::Database(e) => match CollaboratorError::from(e) {
            CollaboratorError::Timeout { collaborator, .. } => CollaboratorError::Timeout {
                collaborator,
                elapsed: db.config().busy_timeout,
            },
            other => other,
        },
        other => CollaboratorError::Unavailable {
            collaborator: COLLABORATOR,
            reason: other.to_string(),
        },
    }
}

impl IdentityStore for SqliteIdentityStore {
    fn get_identity(&self, reference: &Reference) -> std::result::Result<Option<Identity>, CollaboratorError> {
        let db = self.lock()?;
        db.find_identity(reference).map_err(|e| to_collaborator(&db, e))
    }

    fn get_head_revision(
        &self,
        identity: &Identity,
    ) -> std::result::Result<Option<Revision>, CollaboratorError> {
        let db = self.lock()?;
        db.get_head_revision(identity.seq_id())
            .map_err(|e| to_collaborator(&db, e))
    }
}
