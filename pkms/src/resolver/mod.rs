//! Read-only resolution of logical references.
//!
//! A [`Resolver`] combines an [`IdentityStore`](crate::identity::IdentityStore)
//! and an [`ExistenceChecker`] into a graded [`ResolvedTarget`]. "The system
//! does not know" is always an outcome value; only malformed references and
//! collaborator failures are errors.

pub mod checker;
pub mod engine;
pub mod outcome;

pub use checker::{
    sha256_file, AbsenceCheck, CheckReport, ExistenceChecker, FilesystemCheckConfig,
    FilesystemChecker, HashMatch, Presence, ScriptedChecker, ScriptedFailure, TimeoutChecker,
};
pub use engine::{ResolveOptions, Resolver};
pub use outcome::{
    Currency, HashConflict, IdentityEcho, Outcome, ResolutionStatus, ResolvedTarget, RevisionEcho,
};
