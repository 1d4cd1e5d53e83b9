//! Append-side operations used by ingestion.
//!
//! Every write runs in an immediate transaction so concurrent writers
//! serialize on the database lock instead of failing mid-way.

use std::collections::BTreeSet;

use chrono::Utc;
use rusqlite::{params, ErrorCode, OptionalExtension, TransactionBehavior};

use crate::error::{Error, Result};
use crate::identity::{normalize_extension, Capability, FileId, FileUid, Identity, Revision, RevisionId, SeqId};

use super::connection::Database;
use super::operations::{capabilities_to_json, timestamp_to_text};

const INSERT_IDENTITY: &str = r"
    INSERT INTO identities (file_id, file_extension, file_uid, capabilities, registered_at)
    VALUES (?1, ?2, ?3, ?4, ?5)
";

const INSERT_HEAD: &str = "INSERT INTO heads (seq_id, revision_id) VALUES (?1, NULL)";

const IDENTITY_EXISTS: &str = "SELECT 1 FROM identities WHERE seq_id = ?1";

const NEXT_ORDINAL: &str = "SELECT COALESCE(MAX(ordinal), 0) + 1 FROM revisions WHERE seq_id = ?1";

const INSERT_REVISION: &str = r"
    INSERT INTO revisions
    (seq_id, revision_id, ordinal, content_hash, size, scheme, authority, segments,
     captured_at, metadata, capabilities)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
";

const REVISION_EXISTS: &str = "SELECT 1 FROM revisions WHERE seq_id = ?1 AND revision_id = ?2";

const UPDATE_HEAD: &str = "UPDATE heads SET revision_id = ?2 WHERE seq_id = ?1";

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation)
}

fn unknown_identity(seq_id: SeqId) -> Error {
    Error::NotFound {
        resource: format!("identity {}", seq_id.raw()),
    }
}

impl Database {
    /// Registers a new identity with a detached HEAD.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the extension is malformed or the
    /// `(file_id, extension)` pair or uid is already registered.
    pub fn register_identity(
        &mut self,
        file_id: &FileId,
        extension: Option<&str>,
        file_uid: Option<&FileUid>,
        capabilities: &BTreeSet<Capability>,
    ) -> Result<Identity> {
        let extension = match extension {
            Some(extension) => normalize_extension(extension)?,
            None => None,
        };
        let capabilities_json = capabilities_to_json(capabilities)?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let inserted = tx.execute(
            INSERT_IDENTITY,
            params![
                file_id.as_str(),
                extension,
                file_uid.map(FileUid::as_str),
                capabilities_json,
                Utc::now().timestamp(),
            ],
        );
        match inserted {
            Ok(_) => {}
            Err(e) if is_constraint_violation(&e) => {
                return Err(Error::Validation {
                    field: "file_id".into(),
                    message: format!(
                        "'{file_id}{}' or its uid is already registered",
                        extension.as_deref().unwrap_or_default()
                    ),
                });
            }
            Err(e) => return Err(e.into()),
        }
        let seq_id = SeqId::from_raw(tx.last_insert_rowid());
        tx.execute(INSERT_HEAD, params![seq_id.raw()])?;
        tx.commit()?;

        let mut identity = Identity::new(seq_id, file_id.clone(), extension.as_deref())?
            .with_capabilities(capabilities.iter().cloned());
        if let Some(uid) = file_uid {
            identity = identity.with_file_uid(uid.clone());
        }
        log::debug!("registered identity {} as {}", identity.file_id(), seq_id.raw());
        Ok(identity)
    }

    /// Appends a revision. HEAD is not moved.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown identity and a validation error if
    /// the revision id is already used by this identity.
    pub fn append_revision(&mut self, seq_id: SeqId, revision: &Revision) -> Result<()> {
        let location = revision.location();
        let segments = serde_json::to_string(location.segments())?;
        let metadata = serde_json::to_string(revision.metadata())?;
        let capabilities = capabilities_to_json(revision.capabilities())?;
        let size = i64::try_from(revision.size()).map_err(|_| Error::Validation {
            field: "size".into(),
            message: format!("{} does not fit the index", revision.size()),
        })?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let exists = tx
            .query_row(IDENTITY_EXISTS, params![seq_id.raw()], |_| Ok(()))
            .optional()?;
        if exists.is_none() {
            return Err(unknown_identity(seq_id));
        }

        let ordinal: i64 = tx.query_row(NEXT_ORDINAL, params![seq_id.raw()], |row| row.get(0))?;
        let inserted = tx.execute(
            INSERT_REVISION,
            params![
                seq_id.raw(),
                revision.revision_id().as_str(),
                ordinal,
                revision.content_hash().as_str(),
                size,
                location.scheme(),
                location.authority(),
                segments,
                timestamp_to_text(revision.captured_at()),
                metadata,
                capabilities,
            ],
        );
        match inserted {
            Ok(_) => {}
            Err(e) if is_constraint_violation(&e) => {
                return Err(Error::Validation {
                    field: "revision_id".into(),
                    message: format!(
                        "revision '{}' already exists for identity {}",
                        revision.revision_id(),
                        seq_id.raw()
                    ),
                });
            }
            Err(e) => return Err(e.into()),
        }
        tx.commit()?;
        Ok(())
    }

    /// Points HEAD at one of the identity's revisions.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the identity or the revision does not exist.
    pub fn set_head(&mut self, seq_id: SeqId, revision_id: &RevisionId) -> Result<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let exists = tx
            .query_row(
                REVISION_EXISTS,
                params![seq_id.raw(), revision_id.as_str()],
                |_| Ok(()),
            )
            .optional()?;
        if exists.is_none() {
            return Err(Error::NotFound {
                resource: format!("revision {revision_id} of identity {}", seq_id.raw()),
            });
        }
        tx.execute(UPDATE_HEAD, params![seq_id.raw(), revision_id.as_str()])?;
        tx.commit()?;
        Ok(())
    }

    /// Detaches HEAD; resolution then follows the latest revision.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown identity.
    pub fn detach_head(&mut self, seq_id: SeqId) -> Result<()> {
        let updated = self
            .conn
            .execute(UPDATE_HEAD, params![seq_id.raw(), Option::<&str>::None])?;
        if updated == 0 {
            return Err(unknown_identity(seq_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_util::{create_test_database, revision, NOTE};

    fn register_note(db: &mut Database) -> Identity {
        db.register_identity(&FileId::new(NOTE).unwrap(), Some("md"), None, &BTreeSet::new())
            .unwrap()
    }

    #[test]
    fn test_register_normalizes_extension() {
        let mut db = create_test_database();
        let identity = register_note(&mut db);
        assert_eq!(identity.extension(), Some(".md"));
        assert_eq!(db.get_identity(identity.seq_id()).unwrap().unwrap(), identity);
    }

    #[test]
    fn test_register_duplicate_key_is_rejected() {
        let mut db = create_test_database();
        register_note(&mut db);
        let err = db
            .register_identity(&FileId::new(NOTE).unwrap(), Some(".MD"), None, &BTreeSet::new())
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));

        // Same id with a different extension is a different identity.
        db.register_identity(&FileId::new(NOTE).unwrap(), Some(".txt"), None, &BTreeSet::new())
            .unwrap();
    }

    #[test]
    fn test_register_duplicate_missing_extension_is_rejected() {
        let mut db = create_test_database();
        let file_id = FileId::new("readme").unwrap();
        db.register_identity(&file_id, None, None, &BTreeSet::new()).unwrap();
        assert!(db.register_identity(&file_id, None, None, &BTreeSet::new()).is_err());
    }

    #[test]
    fn test_register_duplicate_uid_is_rejected() {
        let mut db = create_test_database();
        let uid = FileUid::new("u-1").unwrap();
        db.register_identity(&FileId::new("a").unwrap(), None, Some(&uid), &BTreeSet::new())
            .unwrap();
        let err = db
            .register_identity(&FileId::new("b").unwrap(), None, Some(&uid), &BTreeSet::new())
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn test_append_to_unknown_identity() {
        let mut db = create_test_database();
        let err = db
            .append_revision(SeqId::from_raw(42), &revision("r1", "aa"))
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_append_duplicate_revision_id() {
        let mut db = create_test_database();
        let identity = register_note(&mut db);
        db.append_revision(identity.seq_id(), &revision("r1", "aa")).unwrap();
        let err = db
            .append_revision(identity.seq_id(), &revision("r1", "bb"))
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert_eq!(db.list_revisions(identity.seq_id()).unwrap().len(), 1);
    }

    #[test]
    fn test_revision_ids_are_scoped_to_identity() {
        let mut db = create_test_database();
        let a = register_note(&mut db);
        let b = db
            .register_identity(&FileId::new("other").unwrap(), None, None, &BTreeSet::new())
            .unwrap();
        db.append_revision(a.seq_id(), &revision("r1", "aa")).unwrap();
        db.append_revision(b.seq_id(), &revision("r1", "aa")).unwrap();
    }

    #[test]
    fn test_revisions_are_append_only() {
        let mut db = create_test_database();
        let identity = register_note(&mut db);
        db.append_revision(identity.seq_id(), &revision("r1", "aa")).unwrap();

        let update = db
            .connection()
            .execute("UPDATE revisions SET content_hash = 'bb'", []);
        assert!(update.is_err());
        let delete = db.connection().execute("DELETE FROM revisions", []);
        assert!(delete.is_err());
        assert_eq!(db.list_revisions(identity.seq_id()).unwrap().len(), 1);
    }

    #[test]
    fn test_set_head_requires_own_revision() {
        let mut db = create_test_database();
        let a = register_note(&mut db);
        let b = db
            .register_identity(&FileId::new("other").unwrap(), None, None, &BTreeSet::new())
            .unwrap();
        db.append_revision(b.seq_id(), &revision("rb", "bb")).unwrap();

        let err = db
            .set_head(a.seq_id(), &RevisionId::new("rb").unwrap())
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_detach_unknown_identity() {
        let mut db = create_test_database();
        assert!(matches!(
            db.detach_head(SeqId::from_raw(7)),
            Err(Error::NotFound { .. })
        ));
    }
}
