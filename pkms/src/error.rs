//! Error types for the pkms library.
//!
//! Each concern owns a narrow error enum (`ParseError`, `ConstructionError`,
//! `ProjectionError`, `ResolverError`, `CollaboratorError`); the crate-level
//! [`Error`] aggregates them together with storage and configuration
//! failures. Absence of a resource is never an error: it is reported by the
//! resolver as a value.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::location::PathTarget;

/// Result type alias for operations that may fail with a pkms error.
///
/// # Examples
///
/// ```
/// use pkms::{Error, Result};
///
/// fn example_operation() -> Result<u32> {
///     Ok(1)
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// Failure to parse URI or filesystem path text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The text does not follow the supported URI grammar.
    #[error("invalid URI '{input}': {reason}")]
    InvalidUri {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A percent-escape is truncated, non-hex, or decodes to invalid UTF-8.
    #[error("invalid percent-escape in '{segment}' at byte {position}")]
    InvalidEscape {
        /// The raw (undecoded) segment or component.
        segment: String,
        /// Byte offset of the offending `%`.
        position: usize,
    },

    /// A filesystem path could not be imported as a location.
    #[error("invalid filesystem path '{path}': {reason}")]
    InvalidFilesystemPath {
        /// The rejected path.
        path: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// A location value was assembled from parts that violate its invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstructionError {
    /// The root marker is misplaced, duplicated, or stands alone.
    #[error("invalid path segments: {reason}")]
    InvalidSegments {
        /// Which invariant was violated.
        reason: String,
    },

    /// The scheme is empty or contains characters outside the URI grammar.
    #[error("invalid scheme '{scheme}'")]
    InvalidScheme {
        /// The rejected scheme.
        scheme: String,
    },

    /// The authority cannot be combined with the rest of the location.
    #[error("invalid authority '{authority}': {reason}")]
    InvalidAuthority {
        /// The rejected authority.
        authority: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// A location cannot be expressed as a path on the requested platform.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectionError {
    /// Segment content or location shape has no representation on `target`.
    #[error("location cannot be projected to a {target} path: {reason}")]
    Unprojectable {
        /// The requested target convention.
        target: PathTarget,
        /// What made the projection impossible.
        reason: String,
    },
}

/// The resolver step during which a collaborator failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveStep {
    /// Looking up the identity by selector.
    IdentityLookup,
    /// Selecting the HEAD (or most recent) revision.
    HeadSelection,
    /// Asking the checker about the revision location.
    ExistenceCheck,
    /// Asking the checker to confirm that no bytes exist for an unknown reference.
    AbsenceCheck,
}

impl fmt::Display for ResolveStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IdentityLookup => write!(f, "identity lookup"),
            Self::HeadSelection => write!(f, "head selection"),
            Self::ExistenceCheck => write!(f, "existence check"),
            Self::AbsenceCheck => write!(f, "absence check"),
        }
    }
}

/// Failure raised by an injected collaborator (identity store or checker).
#[derive(Debug, Error)]
pub enum CollaboratorError {
    /// The collaborator did not answer within the caller-imposed budget.
    #[error("{collaborator} timed out after {}ms", .elapsed.as_millis())]
    Timeout {
        /// Which collaborator timed out.
        collaborator: &'static str,
        /// How long the caller waited.
        elapsed: Duration,
    },

    /// An I/O failure other than "not found".
    #[error("{collaborator} I/O failure at {}: {source}", .path.display())]
    Io {
        /// Which collaborator failed.
        collaborator: &'static str,
        /// The path being examined.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The identity store's backing database failed.
    #[error("identity store query failed: {0}")]
    Store(#[source] rusqlite::Error),

    /// The collaborator cannot examine this kind of location.
    #[error("{collaborator} does not support {reason}")]
    Unsupported {
        /// Which collaborator refused.
        collaborator: &'static str,
        /// What it cannot handle.
        reason: String,
    },

    /// The collaborator is in a state where it cannot answer.
    #[error("{collaborator} unavailable: {reason}")]
    Unavailable {
        /// Which collaborator is unavailable.
        collaborator: &'static str,
        /// Why.
        reason: String,
    },
}

impl CollaboratorError {
    /// Check whether this failure is a timeout.
    ///
    /// # Examples
    ///
    /// ```
    /// use pkms::error::CollaboratorError;
    /// use std::time::Duration;
    ///
    /// let err = CollaboratorError::Timeout {
    ///     collaborator: "existence checker",
    ///     elapsed: Duration::from_millis(250),
    /// };
    /// assert!(err.is_timeout());
    /// ```
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl From<rusqlite::Error> for CollaboratorError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref sqlite_err, _)
                if matches!(
                    sqlite_err.code,
                    rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
                ) =>
            {
                Self::Timeout {
                    collaborator: "identity store",
                    elapsed: Duration::ZERO,
                }
            }
            other => Self::Store(other),
        }
    }
}

/// Failure of a resolution request.
///
/// Only malformed references and collaborator failures are errors; every
/// addressing outcome (including "not found") is a normal return value.
#[derive(Debug, Error)]
pub enum ResolverError {
    /// The reference is syntactically malformed or uses an unsupported scheme.
    #[error("invalid reference '{reference}': {reason}")]
    InvalidReference {
        /// The rejected reference text.
        reference: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A collaborator failed; carries the step and subject for retry decisions.
    #[error("{step} failed for {subject}: {source}")]
    Collaborator {
        /// The step being executed.
        step: ResolveStep,
        /// The identity (or reference, before lookup succeeded) being resolved.
        subject: String,
        /// The collaborator failure.
        #[source]
        source: CollaboratorError,
    },
}

impl ResolverError {
    /// Check whether this failure is a collaborator timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Collaborator { source, .. } if source.is_timeout())
    }
}

/// The main error type for the pkms library.
#[derive(Debug, Error)]
pub enum Error {
    /// URI or path text could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A location value could not be constructed.
    #[error(transparent)]
    Construction(#[from] ConstructionError),

    /// A location could not be projected to a filesystem path.
    #[error(transparent)]
    Projection(#[from] ProjectionError),

    /// A resolution request failed.
    #[error(transparent)]
    Resolver(#[from] ResolverError),

    /// A collaborator failed outside of a resolution request.
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A configuration error occurred.
    #[error("configuration error: {0}")]
    Configuration(#[from] serde_yaml::Error),

    /// A stored JSON column could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A validation error occurred.
    #[error("validation error for '{field}': {message}")]
    Validation {
        /// The field that failed validation.
        field: String,
        /// A description of the validation failure.
        message: String,
    },

    /// A record referenced by an ingestion call does not exist.
    #[error("not found: {resource}")]
    NotFound {
        /// The resource that was not found.
        resource: String,
    },

    /// The workspace directory does not exist.
    #[error("workspace directory not found: {}", .path.display())]
    WorkspaceNotFound {
        /// The expected workspace path.
        path: PathBuf,
    },

    /// Database contents are inconsistent with the schema.
    #[error("database corruption detected: {details}")]
    DatabaseCorruption {
        /// Details about the corruption.
        details: String,
    },

    /// The database schema version is not supported by this build.
    #[error("unsupported schema version: expected {expected}, found {found}")]
    UnsupportedSchemaVersion {
        /// The expected schema version.
        expected: i32,
        /// The version found in the database.
        found: i32,
    },
}

impl From<crate::identity::ValidationError> for Error {
    fn from(err: crate::identity::ValidationError) -> Self {
        Self::Validation {
            field: err.field,
            message: err.message,
        }
    }
}

impl Error {
    /// Check if the error was caused by malformed caller input.
    ///
    /// # Examples
    ///
    /// ```
    /// use pkms::error::{Error, ParseError};
    ///
    /// let err: Error = ParseError::InvalidUri {
    ///     input: "nope".into(),
    ///     reason: "missing scheme".into(),
    /// }
    /// .into();
    /// assert!(err.is_invalid_input());
    /// ```
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::Parse(_)
                | Self::Construction(_)
                | Self::Projection(_)
                | Self::Validation { .. }
                | Self::Resolver(ResolverError::InvalidReference { .. })
        )
    }

    /// Check if the error is a collaborator timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Resolver(err) => err.is_timeout(),
            Self::Collaborator(err) => err.is_timeout(),
            _ => false,
        }
    }
}
