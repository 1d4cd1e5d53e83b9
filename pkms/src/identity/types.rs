//! Identity, revision, and HEAD value types.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::location::FileLocation;

/// Validates a token-like identifier: non-empty, no whitespace or control
/// characters, none of `/`, `.`, `:`. Returns the lowercased form.
fn validate_token(field: &str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(field, "must be non-empty"));
    }
    if let Some(c) = trimmed
        .chars()
        .find(|c| c.is_whitespace() || c.is_control() || matches!(c, '/' | '.' | ':'))
    {
        return Err(ValidationError::new(
            field,
            format!("must not contain {c:?}"),
        ));
    }
    Ok(trimmed.to_lowercase())
}

/// Normalizes a file extension to the lowercase, dot-prefixed form.
///
/// `"md"`, `".md"` and `".MD"` all become `".md"`. An empty string or a
/// lone `"."` means "no extension".
///
/// # Errors
///
/// Returns an error if the extension contains whitespace, a control
/// character, or `/`.
///
/// # Examples
///
/// ```
/// use pkms::identity::normalize_extension;
///
/// assert_eq!(normalize_extension("MD").unwrap(), Some(".md".to_string()));
/// assert_eq!(normalize_extension(".tar.gz").unwrap(), Some(".tar.gz".to_string()));
/// assert_eq!(normalize_extension("").unwrap(), None);
/// assert!(normalize_extension(".m d").is_err());
/// ```
pub fn normalize_extension(extension: &str) -> Result<Option<String>, ValidationError> {
    let bare = extension.strip_prefix('.').unwrap_or(extension);
    if bare.is_empty() {
        return Ok(None);
    }
    if let Some(c) = bare
        .chars()
        .find(|c| c.is_whitespace() || c.is_control() || *c == '/')
    {
        return Err(ValidationError::new(
            "extension",
            format!("must not contain {c:?}"),
        ));
    }
    Ok(Some(format!(".{}", bare.to_lowercase())))
}

/// Human-assigned, case-insensitive identifier of a resource.
///
/// Stored lowercased, so equality is case-insensitive.
///
/// # Examples
///
/// ```
/// use pkms::identity::FileId;
///
/// let id = FileId::new("2024-01-01-0001").unwrap();
/// assert_eq!(id, FileId::new("2024-01-01-0001").unwrap());
/// assert!(FileId::new("").is_err());
/// assert!(FileId::new("a b").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FileId(String);

impl FileId {
    /// Creates a validated file id.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is empty or contains whitespace, `/`, `.`
    /// or `:`.
    pub fn new(value: &str) -> Result<Self, ValidationError> {
        validate_token("file_id", value).map(Self)
    }

    /// The lowercased id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Content- or generation-derived identifier, stable across relocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FileUid(String);

impl FileUid {
    /// Creates a validated uid.
    ///
    /// # Errors
    ///
    /// Returns an error if the uid is empty or contains whitespace, `/`, `.`
    /// or `:`.
    pub fn new(value: &str) -> Result<Self, ValidationError> {
        validate_token("file_uid", value).map(Self)
    }

    /// The lowercased uid.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Hex digest of a revision's bytes, lowercased.
///
/// # Examples
///
/// ```
/// use pkms::identity::ContentHash;
///
/// let hash = ContentHash::new("DEADBEEF").unwrap();
/// assert_eq!(hash.as_str(), "deadbeef");
/// assert!(ContentHash::new("xyz").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentHash(String);

impl ContentHash {
    /// Creates a content hash from hex text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is empty or not hexadecimal.
    pub fn new(hex: &str) -> Result<Self, ValidationError> {
        let hex = hex.trim();
        if hex.is_empty() {
            return Err(ValidationError::new("content_hash", "must be non-empty"));
        }
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ValidationError::new(
                "content_hash",
                "must contain only hexadecimal digits",
            ));
        }
        Ok(Self(hex.to_ascii_lowercase()))
    }

    /// The lowercase hex digest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identifier of one revision, unique within its identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RevisionId(String);

impl RevisionId {
    /// Creates a revision id.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is empty or contains whitespace.
    pub fn new(value: &str) -> Result<Self, ValidationError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ValidationError::new("revision_id", "must be non-empty"));
        }
        if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(ValidationError::new(
                "revision_id",
                "must not contain whitespace",
            ));
        }
        Ok(Self(value.to_string()))
    }

    /// The id text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A capability tag reported by identity or revision records.
///
/// The resolver only echoes capabilities; it never derives them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Capability(String);

impl Capability {
    /// Creates a capability tag.
    ///
    /// # Errors
    ///
    /// Returns an error if the tag is empty after trimming.
    pub fn new(value: &str) -> Result<Self, ValidationError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ValidationError::new("capability", "must be non-empty"));
        }
        Ok(Self(value.to_string()))
    }

    /// The tag text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

macro_rules! string_newtype_impls {
    ($($name:ident),+) => {
        $(
            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.0)
                }
            }

            impl TryFrom<String> for $name {
                type Error = ValidationError;

                fn try_from(value: String) -> Result<Self, Self::Error> {
                    Self::new(&value)
                }
            }

            impl From<$name> for String {
                fn from(value: $name) -> Self {
                    value.0
                }
            }
        )+
    };
}

string_newtype_impls!(FileId, FileUid, ContentHash, RevisionId, Capability);

/// Storage-local sequence id of an identity.
///
/// Meaningful only to the store that issued it; never serialized or
/// reported in resolver output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeqId(i64);

impl SeqId {
    /// Wraps a store-issued value.
    #[must_use]
    pub const fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    /// The store-issued value.
    #[must_use]
    pub const fn raw(self) -> i64 {
        self.0
    }
}

/// The stable logical reference to a resource.
///
/// # Examples
///
/// ```
/// use pkms::identity::{FileId, Identity, SeqId};
///
/// let identity = Identity::new(SeqId::from_raw(1), FileId::new("note-1").unwrap(), Some(".MD"))
///     .unwrap();
/// assert_eq!(identity.extension(), Some(".md"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    #[serde(skip)]
    seq_id: SeqId,
    file_id: FileId,
    extension: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_uid: Option<FileUid>,
    capabilities: BTreeSet<Capability>,
}

impl Identity {
    /// Creates an identity record.
    ///
    /// # Errors
    ///
    /// Returns an error if the extension is malformed.
    pub fn new(
        seq_id: SeqId,
        file_id: FileId,
        extension: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let extension = match extension {
            Some(extension) => normalize_extension(extension)?,
            None => None,
        };
        Ok(Self {
            seq_id,
            file_id,
            extension,
            file_uid: None,
            capabilities: BTreeSet::new(),
        })
    }

    /// Sets the uid.
    #[must_use]
    pub fn with_file_uid(mut self, file_uid: FileUid) -> Self {
        self.file_uid = Some(file_uid);
        self
    }

    /// Adds capability tags.
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: impl IntoIterator<Item = Capability>) -> Self {
        self.capabilities.extend(capabilities);
        self
    }

    /// The storage-local sequence id.
    #[must_use]
    pub const fn seq_id(&self) -> SeqId {
        self.seq_id
    }

    /// The case-insensitive file id.
    #[must_use]
    pub const fn file_id(&self) -> &FileId {
        &self.file_id
    }

    /// The normalized extension, including the leading dot.
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    /// The uid, if one was assigned.
    #[must_use]
    pub const fn file_uid(&self) -> Option<&FileUid> {
        self.file_uid.as_ref()
    }

    /// Capabilities recorded on the identity.
    #[must_use]
    pub const fn capabilities(&self) -> &BTreeSet<Capability> {
        &self.capabilities
    }
}

/// An immutable captured content-state of an identity.
///
/// # Examples
///
/// ```
/// use pkms::identity::{ContentHash, Revision, RevisionId};
/// use pkms::location::FileLocation;
///
/// let revision = Revision::builder(
///     RevisionId::new("r1").unwrap(),
///     ContentHash::new("deadbeef").unwrap(),
///     FileLocation::from_uri("file:///vault/a.md").unwrap(),
/// )
/// .size(42)
/// .metadata("title", "A")
/// .build()
/// .unwrap();
/// assert_eq!(revision.size(), 42);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Revision {
    revision_id: RevisionId,
    content_hash: ContentHash,
    size: u64,
    location: FileLocation,
    captured_at: DateTime<Utc>,
    metadata: BTreeMap<String, String>,
    capabilities: BTreeSet<Capability>,
}

impl Revision {
    /// Starts building a revision.
    #[must_use]
    pub fn builder(
        revision_id: RevisionId,
        content_hash: ContentHash,
        location: FileLocation,
    ) -> RevisionBuilder {
        RevisionBuilder {
            revision_id,
            content_hash,
            location,
            size: 0,
            captured_at: None,
            metadata: BTreeMap::new(),
            capabilities: BTreeSet::new(),
        }
    }

    /// The revision id.
    #[must_use]
    pub const fn revision_id(&self) -> &RevisionId {
        &self.revision_id
    }

    /// Digest of the captured bytes.
    #[must_use]
    pub const fn content_hash(&self) -> &ContentHash {
        &self.content_hash
    }

    /// Size of the captured bytes.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Where the bytes were when the revision was captured.
    #[must_use]
    pub const fn location(&self) -> &FileLocation {
        &self.location
    }

    /// When the revision was captured.
    #[must_use]
    pub const fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Free-form metadata recorded at capture.
    #[must_use]
    pub const fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// Capabilities recorded on this revision.
    #[must_use]
    pub const fn capabilities(&self) -> &BTreeSet<Capability> {
        &self.capabilities
    }
}

/// Builder for [`Revision`].
#[derive(Debug)]
pub struct RevisionBuilder {
    revision_id: RevisionId,
    content_hash: ContentHash,
    location: FileLocation,
    size: u64,
    captured_at: Option<DateTime<Utc>>,
    metadata: BTreeMap<String, String>,
    capabilities: BTreeSet<Capability>,
}

impl RevisionBuilder {
    /// Sets the byte size.
    #[must_use]
    pub const fn size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    /// Sets the capture time. Defaults to now.
    #[must_use]
    pub const fn captured_at(mut self, captured_at: DateTime<Utc>) -> Self {
        self.captured_at = Some(captured_at);
        self
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Adds a capability tag.
    #[must_use]
    pub fn capability(mut self, capability: Capability) -> Self {
        self.capabilities.insert(capability);
        self
    }

    /// Finishes the revision.
    ///
    /// # Errors
    ///
    /// Returns an error if a metadata key is empty after trimming.
    pub fn build(self) -> Result<Revision, ValidationError> {
        if self.metadata.keys().any(|key| key.trim().is_empty()) {
            return Err(ValidationError::new(
                "metadata",
                "metadata keys must be non-empty",
            ));
        }

        Ok(Revision {
            revision_id: self.revision_id,
            content_hash: self.content_hash,
            size: self.size,
            location: self.location,
            captured_at: self.captured_at.unwrap_or_else(Utc::now),
            metadata: self.metadata,
            capabilities: self.capabilities,
        })
    }
}

/// The mutable pointer from an identity to its active revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Head {
    /// HEAD names a revision.
    Revision(RevisionId),
    /// No revision is active; readers fall back to the most recent one.
    Detached,
}

/// Validation error for identity and revision fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The field that failed validation.
    pub field: String,
    /// Description of the validation failure.
    pub message: String,
}

impl ValidationError {
    pub(crate) fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation error for '{}': {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}
