//! Resolution outcomes and the `ResolvedTarget` response value.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::identity::{Capability, ContentHash, FileId, FileUid, Identity, Revision, RevisionId};
use crate::location::FileLocation;

/// The graded addressing result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    /// No identity matches the reference.
    NotFound,
    /// HEAD bytes are present at the recorded location and consistent.
    ResolvedCurrent,
    /// The record exists but its bytes are no longer at the recorded location.
    ResolvedHistorical,
    /// The identity exists but has no revision.
    ResolvedPartial,
    /// The bytes at the recorded location hash differently from the record.
    Conflict,
}

impl Outcome {
    /// The wire name, e.g. `RESOLVED_CURRENT`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::ResolvedCurrent => "RESOLVED_CURRENT",
            Self::ResolvedHistorical => "RESOLVED_HISTORICAL",
            Self::ResolvedPartial => "RESOLVED_PARTIAL",
            Self::Conflict => "CONFLICT",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Existence/lifecycle classification refining an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolutionStatus {
    /// Record and bytes present and consistent.
    Ok,
    /// Record present, bytes in a reversible holding area.
    Trashed,
    /// Record present, bytes permanently gone.
    Deleted,
    /// No record and no bytes, confirmed by a completed check.
    Absent,
    /// Existence was not or could not be established.
    Unknown,
}

impl ResolutionStatus {
    /// The wire name, e.g. `TRASHED`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Trashed => "TRASHED",
            Self::Deleted => "DELETED",
            Self::Absent => "ABSENT",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ResolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tri-state `is_current` flag, serialized as `true`, `false` or `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Currency {
    /// The selected revision is what the location holds now.
    Current,
    /// The location no longer holds the selected revision.
    Stale,
    /// Currency could not be established.
    Unknown,
}

impl Currency {
    /// `Some(true)`, `Some(false)` or `None`.
    #[must_use]
    pub const fn as_bool(self) -> Option<bool> {
        match self {
            Self::Current => Some(true),
            Self::Stale => Some(false),
            Self::Unknown => None,
        }
    }
}

impl Serialize for Currency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_bool().serialize(serializer)
    }
}

/// Identity facts echoed in a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityEcho {
    /// The file id.
    pub file_id: FileId,
    /// The uid, when assigned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_uid: Option<FileUid>,
    /// The extension, including the leading dot.
    pub extension: Option<String>,
}

impl From<&Identity> for IdentityEcho {
    fn from(identity: &Identity) -> Self {
        Self {
            file_id: identity.file_id().clone(),
            file_uid: identity.file_uid().cloned(),
            extension: identity.extension().map(str::to_string),
        }
    }
}

/// Revision facts echoed in a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevisionEcho {
    /// The revision id.
    pub id: RevisionId,
    /// The recorded hash.
    pub content_hash: ContentHash,
    /// When the revision was captured.
    pub captured_at: DateTime<Utc>,
}

impl From<&Revision> for RevisionEcho {
    fn from(revision: &Revision) -> Self {
        Self {
            id: revision.revision_id().clone(),
            content_hash: revision.content_hash().clone(),
            captured_at: revision.captured_at(),
        }
    }
}

/// Expected versus observed facts behind a `CONFLICT`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HashConflict {
    /// The hash recorded on the revision.
    pub expected: ContentHash,
    /// The hash the checker computed, when it reported one.
    pub observed: Option<ContentHash>,
}

/// Facts about a resource as currently known. Never a guarantee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedTarget {
    /// Identity echo; absent for `NOT_FOUND`.
    pub identity: Option<IdentityEcho>,
    /// The selected revision, if any.
    pub revision: Option<RevisionEcho>,
    /// The last-known location, if any.
    pub file_location: Option<FileLocation>,
    /// Capabilities reported by the identity and revision records.
    pub available_capabilities: BTreeSet<Capability>,
    /// Whether the selected revision is the present content.
    pub is_current: Currency,
    /// Lifecycle status, when requested.
    pub resolution_status: Option<ResolutionStatus>,
    /// The outcome grade.
    pub outcome: Outcome,
    /// Conflict facts, present only for `CONFLICT`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflict: Option<HashConflict>,
    /// Where the checker found the bytes, when elsewhere than `file_location`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_location: Option<FileLocation>,
}

impl ResolvedTarget {
    /// A `NOT_FOUND` response.
    #[must_use]
    pub fn not_found(resolution_status: Option<ResolutionStatus>) -> Self {
        Self {
            identity: None,
            revision: None,
            file_location: None,
            available_capabilities: BTreeSet::new(),
            is_current: Currency::Unknown,
            resolution_status,
            outcome: Outcome::NotFound,
            conflict: None,
            observed_location: None,
        }
    }

    /// A response carrying identity facts only.
    #[must_use]
    pub fn partial(identity: &Identity, resolution_status: Option<ResolutionStatus>) -> Self {
        Self {
            identity: Some(identity.into()),
            available_capabilities: identity.capabilities().clone(),
            resolution_status,
            outcome: Outcome::ResolvedPartial,
            ..Self::not_found(None)
        }
    }

    /// A response for a selected revision.
    #[must_use]
    pub fn for_revision(identity: &Identity, revision: &Revision, outcome: Outcome) -> Self {
        let available_capabilities = identity
            .capabilities()
            .union(revision.capabilities())
            .cloned()
            .collect();
        Self {
            identity: Some(identity.into()),
            revision: Some(revision.into()),
            file_location: Some(revision.location().clone()),
            available_capabilities,
            outcome,
            ..Self::not_found(None)
        }
    }

    /// Whether the outcome is one of the `RESOLVED_*` grades.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        matches!(
            self.outcome,
            Outcome::ResolvedCurrent | Outcome::ResolvedHistorical | Outcome::ResolvedPartial
        )
    }
}
