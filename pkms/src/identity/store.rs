//! The identity-store collaborator seam.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{CollaboratorError, Result};
use crate::identity::{
    Capability, FileId, FileUid, Identity, Revision, RevisionArena, RevisionId, SeqId,
};
use crate::selector::Reference;

/// Read access to identity, revision, and HEAD records.
///
/// Implementations must be safe to call from several resolutions at once.
/// Reads are not transactional: a record may change between
/// `get_identity` and `get_head_revision`.
#[cfg_attr(test, mockall::automock)]
pub trait IdentityStore: Send + Sync {
    /// Looks up the identity a reference selects.
    ///
    /// # Errors
    ///
    /// Returns a `CollaboratorError` if the backing store fails; absence is
    /// `Ok(None)`.
    fn get_identity(&self, reference: &Reference) -> std::result::Result<Option<Identity>, CollaboratorError>;

    /// The HEAD revision of an identity, or its most recent revision when
    /// HEAD is detached. `Ok(None)` when no revision exists.
    ///
    /// # Errors
    ///
    /// Returns a `CollaboratorError` if the backing store fails.
    fn get_head_revision(
        &self,
        identity: &Identity,
    ) -> std::result::Result<Option<Revision>, CollaboratorError>;
}

impl<S: IdentityStore + ?Sized> IdentityStore for Arc<S> {
    fn get_identity(&self, reference: &Reference) -> std::result::Result<Option<Identity>, CollaboratorError> {
        (**self).get_identity(reference)
    }

    fn get_head_revision(
        &self,
        identity: &Identity,
    ) -> std::result::Result<Option<Revision>, CollaboratorError> {
        (**self).get_head_revision(identity)
    }
}

/// Thread-safe in-memory identity store over a [`RevisionArena`].
///
/// The ingestion methods stand in for the ingestion collaborator; the
/// resolver only uses the [`IdentityStore`] reads.
///
/// # Examples
///
/// ```
/// use pkms::identity::{FileId, IdentityStore, MemoryIdentityStore};
/// use pkms::selector::Reference;
///
/// let store = MemoryIdentityStore::new();
/// store.register(FileId::new("note").unwrap(), Some(".md"), None, []).unwrap();
///
/// let reference = Reference::new("id", "note", Some(".md")).unwrap();
/// assert!(store.get_identity(&reference).unwrap().is_some());
/// ```
#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    arena: RwLock<RevisionArena>,
}

impl MemoryIdentityStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing arena.
    #[must_use]
    pub fn from_arena(arena: RevisionArena) -> Self {
        Self {
            arena: RwLock::new(arena),
        }
    }

    fn read(&self) -> std::result::Result<RwLockReadGuard<'_, RevisionArena>, CollaboratorError> {
        self.arena.read().map_err(|_| poisoned())
    }

    fn write(&self) -> std::result::Result<RwLockWriteGuard<'_, RevisionArena>, CollaboratorError> {
        self.arena.write().map_err(|_| poisoned())
    }

    /// Registers an identity.
    ///
    /// # Errors
    ///
    /// Returns a validation error for duplicates or malformed fields.
    pub fn register(
        &self,
        file_id: FileId,
        extension: Option<&str>,
        file_uid: Option<FileUid>,
        capabilities: impl IntoIterator<Item = Capability>,
    ) -> Result<Identity> {
        Ok(self.write()?.register(file_id, extension, file_uid, capabilities)?)
    }

    /// Appends a revision without moving HEAD.
    ///
    /// # Errors
    ///
    /// Returns a validation error for unknown identities or duplicate
    /// revision ids.
    pub fn append_revision(&self, seq_id: SeqId, revision: Revision) -> Result<()> {
        Ok(self.write()?.append_revision(seq_id, revision)?)
    }

    /// Points HEAD at a revision.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the revision does not belong to the
    /// identity.
    pub fn set_head(&self, seq_id: SeqId, revision_id: &RevisionId) -> Result<()> {
        Ok(self.write()?.set_head(seq_id, revision_id)?)
    }

    /// Detaches HEAD.
    ///
    /// # Errors
    ///
    /// Returns a validation error for unknown identities.
    pub fn detach_head(&self, seq_id: SeqId) -> Result<()> {
        Ok(self.write()?.detach_head(seq_id)?)
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn get_identity(&self, reference: &Reference) -> std::result::Result<Option<Identity>, CollaboratorError> {
        Ok(self.read()?.find(reference).cloned())
    }

    fn get_head_revision(
        &self,
        identity: &Identity,
    ) -> std::result::Result<Option<Revision>, CollaboratorError> {
        Ok(self.read()?.head_revision(identity.seq_id()).cloned())
    }
}

fn poisoned() -> CollaboratorError {
    CollaboratorError::Unavailable {
        collaborator: "identity store",
        reason: "lock poisoned by a panicked writer".into(),
    }
}
