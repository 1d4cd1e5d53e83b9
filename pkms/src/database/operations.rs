//! Read operations over identities, revisions, and HEAD pointers.
//!
//! These are the queries the resolver-facing store adapter issues. None of
//! them write.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};

use crate::error::Result;
use crate::identity::{
    Capability, ContentHash, FileId, FileUid, Head, Identity, Revision, RevisionId, SeqId,
};
use crate::location::{FileLocation, PathSegments};
use crate::selector::{LookupField, Reference};

use super::connection::Database;

const IDENTITY_COLUMNS: &str = "seq_id, file_id, file_extension, file_uid, capabilities";

const REVISION_COLUMNS: &str = r"
    revision_id, content_hash, size, scheme, authority, segments,
    captured_at, metadata, capabilities
";

const SELECT_BY_FILE_ID: &str = r"
    WHERE file_id = ?1 AND IFNULL(file_extension, '') = IFNULL(?2, '') COLLATE NOCASE
";

const SELECT_BY_FILE_UID: &str = "WHERE file_uid = ?1";

const SELECT_BY_CONTENT_HASH: &str = r"
    WHERE seq_id IN (SELECT seq_id FROM revisions WHERE content_hash = ?1)
    ORDER BY seq_id
    LIMIT 1
";

const SELECT_HEAD: &str = "SELECT revision_id FROM heads WHERE seq_id = ?1";

/// Wraps a conversion failure of column `index` for rusqlite.
pub(super) fn conversion_error(
    index: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(err))
}

/// Serializes a capability set as a JSON array.
pub(super) fn capabilities_to_json(capabilities: &BTreeSet<Capability>) -> Result<String> {
    Ok(serde_json::to_string(capabilities)?)
}

/// Formats a capture timestamp for storage.
pub(super) fn timestamp_to_text(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn parse_json<T: serde::de::DeserializeOwned>(row: &Row<'_>, index: usize) -> rusqlite::Result<T> {
    let text: String = row.get(index)?;
    serde_json::from_str(&text).map_err(|e| conversion_error(index, e))
}

/// Expects: `seq_id, file_id, file_extension, file_uid, capabilities`.
fn row_to_identity(row: &Row<'_>) -> rusqlite::Result<Identity> {
    let seq_id: i64 = row.get(0)?;
    let file_id: String = row.get(1)?;
    let extension: Option<String> = row.get(2)?;
    let file_uid: Option<String> = row.get(3)?;
    let capabilities: BTreeSet<Capability> = parse_json(row, 4)?;

    let file_id = FileId::new(&file_id).map_err(|e| conversion_error(1, e))?;
    let mut identity = Identity::new(SeqId::from_raw(seq_id), file_id, extension.as_deref())
        .map_err(|e| conversion_error(2, e))?
        .with_capabilities(capabilities);
    if let Some(uid) = file_uid {
        identity = identity.with_file_uid(FileUid::new(&uid).map_err(|e| conversion_error(3, e))?);
    }
    Ok(identity)
}

/// Expects the columns of [`REVISION_COLUMNS`] in order.
fn row_to_revision(row: &Row<'_>) -> rusqlite::Result<Revision> {
    let revision_id: String = row.get(0)?;
    let content_hash: String = row.get(1)?;
    let size: i64 = row.get(2)?;
    let scheme: String = row.get(3)?;
    let authority: Option<String> = row.get(4)?;
    let segments: Vec<Option<String>> = parse_json(row, 5)?;
    let captured_at: String = row.get(6)?;
    let metadata: BTreeMap<String, String> = parse_json(row, 7)?;
    let capabilities: BTreeSet<Capability> = parse_json(row, 8)?;

    let segments = PathSegments::new(segments).map_err(|e| conversion_error(5, e))?;
    let location = FileLocation::new(scheme, authority, segments).map_err(|e| conversion_error(3, e))?;
    let captured_at = DateTime::parse_from_rfc3339(&captured_at)
        .map_err(|e| conversion_error(6, e))?
        .with_timezone(&Utc);
    let size = u64::try_from(size).map_err(|e| conversion_error(2, e))?;

    let mut builder = Revision::builder(
        RevisionId::new(&revision_id).map_err(|e| conversion_error(0, e))?,
        ContentHash::new(&content_hash).map_err(|e| conversion_error(1, e))?,
        location,
    )
    .size(size)
    .captured_at(captured_at);
    for (key, value) in metadata {
        builder = builder.metadata(key, value);
    }
    for capability in capabilities {
        builder = builder.capability(capability);
    }
    builder.build().map_err(|e| conversion_error(7, e))
}

impl Database {
    /// Finds the identity a reference selects.
    ///
    /// `id` matches `(file_id, extension)` case-insensitively; `uid` and
    /// `sha256` ignore the extension. A hash shared by several identities
    /// selects the one registered first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored row is malformed.
    pub fn find_identity(&self, reference: &Reference) -> Result<Option<Identity>> {
        let value = reference.selector().value();
        let identity = match reference.selector().kind().field() {
            LookupField::FileId => self
                .conn
                .query_row(
                    &format!("SELECT {IDENTITY_COLUMNS} FROM identities {SELECT_BY_FILE_ID}"),
                    params![value, reference.extension()],
                    row_to_identity,
                )
                .optional()?,
            LookupField::FileUid => self
                .conn
                .query_row(
                    &format!("SELECT {IDENTITY_COLUMNS} FROM identities {SELECT_BY_FILE_UID}"),
                    params![value],
                    row_to_identity,
                )
                .optional()?,
            LookupField::ContentHash => self
                .conn
                .query_row(
                    &format!("SELECT {IDENTITY_COLUMNS} FROM identities {SELECT_BY_CONTENT_HASH}"),
                    params![value],
                    row_to_identity,
                )
                .optional()?,
        };
        Ok(identity)
    }

    /// Loads an identity by sequence id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the row is malformed.
    pub fn get_identity(&self, seq_id: SeqId) -> Result<Option<Identity>> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {IDENTITY_COLUMNS} FROM identities WHERE seq_id = ?1"),
                params![seq_id.raw()],
                row_to_identity,
            )
            .optional()?)
    }

    /// The HEAD pointer of an identity; `None` for an unknown identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_head(&self, seq_id: SeqId) -> Result<Option<Head>> {
        let head: Option<Option<String>> = self
            .conn
            .query_row(SELECT_HEAD, params![seq_id.raw()], |row| row.get(0))
            .optional()?;
        Ok(match head {
            Some(Some(revision_id)) => Some(Head::Revision(RevisionId::new(&revision_id)?)),
            Some(None) => Some(Head::Detached),
            None => None,
        })
    }

    /// The HEAD revision, or the most recently appended revision when HEAD
    /// is detached. `None` when the identity has no revision.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row is malformed.
    pub fn get_head_revision(&self, seq_id: SeqId) -> Result<Option<Revision>> {
        if let Some(Head::Revision(revision_id)) = self.get_head(seq_id)? {
            let revision = self
                .conn
                .query_row(
                    &format!(
                        "SELECT {REVISION_COLUMNS} FROM revisions WHERE seq_id = ?1 AND revision_id = ?2"
                    ),
                    params![seq_id.raw(), revision_id.as_str()],
                    row_to_revision,
                )
                .optional()?;
            if revision.is_some() {
                return Ok(revision);
            }
            log::warn!("HEAD of identity {} names missing revision {revision_id}", seq_id.raw());
        }

        Ok(self
            .conn
            .query_row(
                &format!(
                    "SELECT {REVISION_COLUMNS} FROM revisions WHERE seq_id = ?1 ORDER BY ordinal DESC LIMIT 1"
                ),
                params![seq_id.raw()],
                row_to_revision,
            )
            .optional()?)
    }

    /// All revisions of an identity in append order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row is malformed.
    pub fn list_revisions(&self, seq_id: SeqId) -> Result<Vec<Revision>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {REVISION_COLUMNS} FROM revisions WHERE seq_id = ?1 ORDER BY ordinal"
        ))?;
        let revisions = stmt
            .query_map(params![seq_id.raw()], row_to_revision)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(revisions)
    }

    /// Number of registered identities.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count_identities(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM identities", [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}
