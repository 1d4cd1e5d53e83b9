//! Arena storage for identities, their revisions, and HEAD pointers.
//!
//! Identities own lists of indices into a single append-only revision
//! vector; HEAD is an index into the same vector. Nothing points backwards,
//! so no cycles can form.

use crate::identity::{
    normalize_extension, Capability, FileId, FileUid, Head, Identity, Revision, RevisionId, SeqId,
    ValidationError,
};
use crate::selector::{LookupField, Reference};

#[derive(Debug, Clone)]
struct IdentityEntry {
    identity: Identity,
    revisions: Vec<usize>,
    head: Option<usize>,
}

/// In-memory identity/revision/HEAD records.
///
/// # Examples
///
/// ```
/// use pkms::identity::{ContentHash, FileId, Revision, RevisionArena, RevisionId};
/// use pkms::location::FileLocation;
/// use pkms::selector::Reference;
///
/// let mut arena = RevisionArena::new();
/// let identity = arena
///     .register(FileId::new("note").unwrap(), Some(".md"), None, [])
///     .unwrap();
/// let revision = Revision::builder(
///     RevisionId::new("r1").unwrap(),
///     ContentHash::new("deadbeef").unwrap(),
///     FileLocation::from_uri("file:///vault/note.md").unwrap(),
/// )
/// .build()
/// .unwrap();
/// arena.append_revision(identity.seq_id(), revision).unwrap();
///
/// let reference = Reference::new("id", "note", Some(".md")).unwrap();
/// let found = arena.find(&reference).unwrap();
/// assert_eq!(arena.head_revision(found.seq_id()).unwrap().revision_id().as_str(), "r1");
/// ```
#[derive(Debug, Clone, Default)]
pub struct RevisionArena {
    identities: Vec<IdentityEntry>,
    revisions: Vec<Revision>,
}

impl RevisionArena {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered identities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.identities.len()
    }

    /// Whether no identity is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    fn index_of(&self, seq_id: SeqId) -> Option<usize> {
        usize::try_from(seq_id.raw())
            .ok()?
            .checked_sub(1)
            .filter(|&index| index < self.identities.len())
    }

    fn entry(&self, seq_id: SeqId) -> Option<&IdentityEntry> {
        self.index_of(seq_id).map(|index| &self.identities[index])
    }

    fn entry_mut(&mut self, seq_id: SeqId) -> Result<&mut IdentityEntry, ValidationError> {
        let index = self.index_of(seq_id).ok_or_else(|| unknown_identity(seq_id))?;
        Ok(&mut self.identities[index])
    }

    /// Registers a new identity and returns it with its assigned seq id.
    ///
    /// # Errors
    ///
    /// Returns an error if the extension is malformed, or if the
    /// `(file_id, extension)` pair or the uid is already registered.
    pub fn register(
        &mut self,
        file_id: FileId,
        extension: Option<&str>,
        file_uid: Option<FileUid>,
        capabilities: impl IntoIterator<Item = Capability>,
    ) -> Result<Identity, ValidationError> {
        let extension = match extension {
            Some(extension) => normalize_extension(extension)?,
            None => None,
        };

        for entry in &self.identities {
            let existing = &entry.identity;
            if existing.file_id() == &file_id && existing.extension() == extension.as_deref() {
                return Err(ValidationError::new(
                    "file_id",
                    format!("'{file_id}' is already registered"),
                ));
            }
            if file_uid.is_some() && existing.file_uid() == file_uid.as_ref() {
                return Err(ValidationError::new("file_uid", "uid is already registered"));
            }
        }

        let raw = i64::try_from(self.identities.len() + 1)
            .map_err(|_| ValidationError::new("seq_id", "identity table is full"))?;
        let mut identity = Identity::new(SeqId::from_raw(raw), file_id, extension.as_deref())?
            .with_capabilities(capabilities);
        if let Some(file_uid) = file_uid {
            identity = identity.with_file_uid(file_uid);
        }

        self.identities.push(IdentityEntry {
            identity: identity.clone(),
            revisions: Vec::new(),
            head: None,
        });
        Ok(identity)
    }

    /// Appends a revision to an identity. HEAD is not moved.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown seq id or a revision id already used
    /// by this identity.
    pub fn append_revision(
        &mut self,
        seq_id: SeqId,
        revision: Revision,
    ) -> Result<(), ValidationError> {
        let entry = self.index_of(seq_id).ok_or_else(|| unknown_identity(seq_id))?;
        let duplicate = self.identities[entry]
            .revisions
            .iter()
            .any(|&existing| self.revisions[existing].revision_id() == revision.revision_id());
        if duplicate {
            return Err(ValidationError::new(
                "revision_id",
                format!("revision '{}' already exists", revision.revision_id()),
            ));
        }

        let index = self.revisions.len();
        self.revisions.push(revision);
        self.identities[entry].revisions.push(index);
        Ok(())
    }

    /// Points HEAD at one of the identity's revisions.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown seq id or a revision that does not
    /// belong to the identity.
    pub fn set_head(&mut self, seq_id: SeqId, revision_id: &RevisionId) -> Result<(), ValidationError> {
        let position = {
            let entry = self.entry(seq_id).ok_or_else(|| unknown_identity(seq_id))?;
            entry
                .revisions
                .iter()
                .copied()
                .find(|&index| self.revisions[index].revision_id() == revision_id)
                .ok_or_else(|| {
                    ValidationError::new(
                        "revision_id",
                        format!("revision '{revision_id}' does not belong to this identity"),
                    )
                })?
        };
        self.entry_mut(seq_id)?.head = Some(position);
        Ok(())
    }

    /// Detaches HEAD; readers fall back to the most recent revision.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown seq id.
    pub fn detach_head(&mut self, seq_id: SeqId) -> Result<(), ValidationError> {
        self.entry_mut(seq_id)?.head = None;
        Ok(())
    }

    /// The current HEAD pointer of an identity.
    #[must_use]
    pub fn head(&self, seq_id: SeqId) -> Option<Head> {
        let entry = self.entry(seq_id)?;
        Some(match entry.head {
            Some(index) => Head::Revision(self.revisions[index].revision_id().clone()),
            None => Head::Detached,
        })
    }

    /// Finds the identity a reference selects.
    ///
    /// `id` matches `(file_id, extension)`; `uid` and `sha256` ignore the
    /// extension. A hash shared by several identities selects the one
    /// registered first.
    #[must_use]
    pub fn find(&self, reference: &Reference) -> Option<&Identity> {
        let selector = reference.selector();
        let value = selector.value();
        self.identities
            .iter()
            .find(|entry| match selector.kind().field() {
                LookupField::FileId => {
                    entry.identity.file_id().as_str() == value
                        && entry.identity.extension() == reference.extension()
                }
                LookupField::FileUid => entry
                    .identity
                    .file_uid()
                    .is_some_and(|uid| uid.as_str() == value),
                LookupField::ContentHash => entry
                    .revisions
                    .iter()
                    .any(|&index| self.revisions[index].content_hash().as_str() == value),
            })
            .map(|entry| &entry.identity)
    }

    /// The HEAD revision, or the most recently appended one when detached.
    #[must_use]
    pub fn head_revision(&self, seq_id: SeqId) -> Option<&Revision> {
        let entry = self.entry(seq_id)?;
        entry
            .head
            .or_else(|| entry.revisions.last().copied())
            .map(|index| &self.revisions[index])
    }

    /// All revisions of an identity, oldest first.
    pub fn revisions(&self, seq_id: SeqId) -> impl Iterator<Item = &Revision> + '_ {
        self.entry(seq_id)
            .into_iter()
            .flat_map(|entry| entry.revisions.iter().map(|&index| &self.revisions[index]))
    }
}

fn unknown_identity(seq_id: SeqId) -> ValidationError {
    ValidationError::new("seq_id", format!("no identity with seq id {}", seq_id.raw()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::ContentHash;
    use crate::location::FileLocation;

    fn revision(id: &str, hash: &str) -> Revision {
        Revision::builder(
            RevisionId::new(id).unwrap(),
            ContentHash::new(hash).unwrap(),
            FileLocation::from_uri(&format!("file:///vault/{id}.md")).unwrap(),
        )
        .build()
        .unwrap()
    }

    fn arena_with_note() -> (RevisionArena, SeqId) {
        let mut arena = RevisionArena::new();
        let identity = arena
            .register(
                FileId::new("2024-01-01-0001").unwrap(),
                Some(".md"),
                Some(FileUid::new("uid-1").unwrap()),
                [],
            )
            .unwrap();
        (arena, identity.seq_id())
    }

    #[test]
    fn test_register_assigns_seq_ids() {
        let mut arena = RevisionArena::new();
        let a = arena.register(FileId::new("a").unwrap(), None, None, []).unwrap();
        let b = arena.register(FileId::new("b").unwrap(), None, None, []).unwrap();
        assert_ne!(a.seq_id(), b.seq_id());
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let (mut arena, _) = arena_with_note();
        let err = arena
            .register(FileId::new("2024-01-01-0001").unwrap(), Some("MD"), None, [])
            .unwrap_err();
        assert_eq!(err.field, "file_id");
        let err = arena
            .register(
                FileId::new("other").unwrap(),
                None,
                Some(FileUid::new("UID-1").unwrap()),
                [],
            )
            .unwrap_err();
        assert_eq!(err.field, "file_uid");
        assert!(arena
            .register(FileId::new("2024-01-01-0001").unwrap(), Some(".txt"), None, [])
            .is_ok());
    }

    #[test]
    fn test_find_by_id_requires_extension() {
        let (arena, seq) = arena_with_note();
        let hit = Reference::new("id", "2024-01-01-0001", Some(".MD")).unwrap();
        assert_eq!(arena.find(&hit).unwrap().seq_id(), seq);
        let miss = Reference::new("id", "2024-01-01-0001", None).unwrap();
        assert!(arena.find(&miss).is_none());
    }

    #[test]
    fn test_find_by_uid_ignores_extension() {
        let (arena, seq) = arena_with_note();
        let reference = Reference::new("uid", "uid-1", Some(".pdf")).unwrap();
        assert_eq!(arena.find(&reference).unwrap().seq_id(), seq);
    }

    #[test]
    fn test_find_by_hash_scans_revisions() {
        let (mut arena, seq) = arena_with_note();
        arena.append_revision(seq, revision("r1", "aa")).unwrap();
        arena.append_revision(seq, revision("r2", "bb")).unwrap();
        let reference = Reference::new("sha256", "AA", None).unwrap();
        assert_eq!(arena.find(&reference).unwrap().seq_id(), seq);
        assert!(arena.find(&Reference::new("sha256", "cc", None).unwrap()).is_none());
    }

    #[test]
    fn test_head_defaults_to_most_recent_when_detached() {
        let (mut arena, seq) = arena_with_note();
        assert!(arena.head_revision(seq).is_none());
        assert_eq!(arena.head(seq), Some(Head::Detached));

        arena.append_revision(seq, revision("r1", "aa")).unwrap();
        arena.append_revision(seq, revision("r2", "bb")).unwrap();
        assert_eq!(arena.head_revision(seq).unwrap().revision_id().as_str(), "r2");

        let r1 = RevisionId::new("r1").unwrap();
        arena.set_head(seq, &r1).unwrap();
        assert_eq!(arena.head(seq), Some(Head::Revision(r1)));
        assert_eq!(arena.head_revision(seq).unwrap().revision_id().as_str(), "r1");

        arena.detach_head(seq).unwrap();
        assert_eq!(arena.head_revision(seq).unwrap().revision_id().as_str(), "r2");
    }

    #[test]
    fn test_set_head_rejects_foreign_revision() {
        let (mut arena, seq) = arena_with_note();
        let other = arena.register(FileId::new("b").unwrap(), None, None, []).unwrap();
        arena.append_revision(other.seq_id(), revision("r9", "aa")).unwrap();
        let err = arena.set_head(seq, &RevisionId::new("r9").unwrap()).unwrap_err();
        assert_eq!(err.field, "revision_id");
    }

    #[test]
    fn test_append_rejects_duplicate_revision_and_unknown_identity() {
        let (mut arena, seq) = arena_with_note();
        arena.append_revision(seq, revision("r1", "aa")).unwrap();
        assert!(arena.append_revision(seq, revision("r1", "bb")).is_err());
        assert!(arena
            .append_revision(SeqId::from_raw(99), revision("r2", "aa"))
            .is_err());
        assert_eq!(arena.revisions(seq).count(), 1);
    }
}
