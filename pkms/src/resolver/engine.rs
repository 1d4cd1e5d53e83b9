//! The resolution algorithm.
//!
//! Resolution is a strictly ordered three-step read: identity lookup, HEAD
//! selection, existence check. Each step short-circuits only on the previous
//! step's absence. The reads are not transactional; records may change
//! between steps and the result reflects whatever each step observed.

use crate::error::{CollaboratorError, ResolveStep, ResolverError};
use crate::identity::{Identity, IdentityStore};
use crate::resolver::checker::{AbsenceCheck, ExistenceChecker, FilesystemChecker, HashMatch, Presence};
use crate::resolver::outcome::{Currency, HashConflict, Outcome, ResolutionStatus, ResolvedTarget};
use crate::selector::Reference;

/// Per-request resolution options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Populate `resolution_status` (and confirm absence for unknown
    /// references).
    pub include_status: bool,
}

impl ResolveOptions {
    /// Options requesting lifecycle status.
    #[must_use]
    pub const fn with_status() -> Self {
        Self {
            include_status: true,
        }
    }
}

/// Translates logical references into best-known facts.
///
/// Both collaborators are injected at construction. The resolver holds no
/// other state, performs no writes, and never retries a failed collaborator
/// call. A single instance may be shared across threads.
///
/// # Examples
///
/// ```
/// use pkms::identity::MemoryIdentityStore;
/// use pkms::resolver::{Outcome, Resolver, ScriptedChecker};
///
/// let resolver = Resolver::new(MemoryIdentityStore::new(), ScriptedChecker::new());
/// let target = resolver.resolve("id", "2024-01-01-0001", Some(".md")).unwrap();
/// assert_eq!(target.outcome, Outcome::NotFound);
/// ```
#[derive(Debug)]
pub struct Resolver<S: IdentityStore, C: ExistenceChecker = FilesystemChecker> {
    store: S,
    checker: C,
}

impl<S: IdentityStore, C: ExistenceChecker> Resolver<S, C> {
    /// Creates a resolver over the given collaborators.
    pub const fn new(store: S, checker: C) -> Self {
        Self { store, checker }
    }

    /// The identity store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The existence checker.
    pub const fn checker(&self) -> &C {
        &self.checker
    }

    /// Resolves `(selector, value, extension)` without lifecycle status.
    ///
    /// # Errors
    ///
    /// Returns `InvalidReference` for malformed selector syntax and
    /// `Collaborator` when a collaborator fails. Every addressing outcome,
    /// including `NOT_FOUND`, is returned as `Ok`.
    pub fn resolve(
        &self,
        selector: &str,
        value: &str,
        extension: Option<&str>,
    ) -> Result<ResolvedTarget, ResolverError> {
        let reference = Reference::new(selector, value, extension)?;
        self.resolve_with(&reference, ResolveOptions::default())
    }

    /// Resolves a `pkms:///file/<selector>:<value>.<ext>` URI.
    ///
    /// # Errors
    ///
    /// See [`Resolver::resolve`]; an unsupported scheme is an
    /// `InvalidReference`.
    pub fn resolve_uri(
        &self,
        uri: &str,
        options: ResolveOptions,
    ) -> Result<ResolvedTarget, ResolverError> {
        let reference = Reference::parse_uri(uri)?;
        self.resolve_with(&reference, options)
    }

    /// Resolves a parsed reference.
    ///
    /// # Errors
    ///
    /// Returns `Collaborator` when the store or checker fails. The error
    /// names the step and the reference or identity being resolved.
    pub fn resolve_with(
        &self,
        reference: &Reference,
        options: ResolveOptions,
    ) -> Result<ResolvedTarget, ResolverError> {
        log::debug!("resolving {reference}");

        // Step 1: identity lookup
        let identity = self
            .store
            .get_identity(reference)
            .map_err(|source| collaborator(ResolveStep::IdentityLookup, reference.to_string(), source))?;
        let Some(identity) = identity else {
            return self.not_found(reference, options);
        };
        let subject = describe(&identity);

        // Step 2: HEAD selection
        let revision = self
            .store
            .get_head_revision(&identity)
            .map_err(|source| collaborator(ResolveStep::HeadSelection, subject.clone(), source))?;
        let Some(revision) = revision else {
            log::debug!("{subject} has no revision");
            let status = options.include_status.then_some(ResolutionStatus::Unknown);
            return Ok(ResolvedTarget::partial(&identity, status));
        };

        // Step 3: existence and integrity
        let report = self
            .checker
            .check(revision.location(), revision.content_hash())
            .map_err(|source| collaborator(ResolveStep::ExistenceCheck, subject.clone(), source))?;

        let (outcome, currency, status) = match (report.presence, report.hash_match) {
            (Presence::Present, HashMatch::Matches) => {
                (Outcome::ResolvedCurrent, Currency::Current, ResolutionStatus::Ok)
            }
            (Presence::Present, HashMatch::Unknown) => {
                (Outcome::ResolvedCurrent, Currency::Unknown, ResolutionStatus::Unknown)
            }
            (Presence::Present, HashMatch::Mismatch) => {
                (Outcome::Conflict, Currency::Stale, ResolutionStatus::Unknown)
            }
            (Presence::Trashed, _) => {
                (Outcome::ResolvedHistorical, Currency::Stale, ResolutionStatus::Trashed)
            }
            // Bytes still exist, only the record is stale
            (Presence::Moved | Presence::Unlocated, _) => {
                (Outcome::ResolvedHistorical, Currency::Stale, ResolutionStatus::Unknown)
            }
            (Presence::Missing, _) => {
                (Outcome::ResolvedHistorical, Currency::Stale, ResolutionStatus::Deleted)
            }
        };

        let mut target = ResolvedTarget::for_revision(&identity, &revision, outcome);
        target.is_current = currency;
        target.resolution_status = options.include_status.then_some(status);
        target.observed_location = report.observed_location;
        if outcome == Outcome::Conflict {
            target.conflict = Some(HashConflict {
                expected: revision.content_hash().clone(),
                observed: report.observed_hash,
            });
        }

        log::debug!(
            "{subject} resolved to {outcome} at revision {}",
            revision.revision_id()
        );
        Ok(target)
    }

    fn not_found(
        &self,
        reference: &Reference,
        options: ResolveOptions,
    ) -> Result<ResolvedTarget, ResolverError> {
        if !options.include_status {
            log::debug!("{reference} not found");
            return Ok(ResolvedTarget::not_found(None));
        }

        let answer = self
            .checker
            .confirm_absence(reference)
            .map_err(|source| collaborator(ResolveStep::AbsenceCheck, reference.to_string(), source))?;
        let status = match answer {
            AbsenceCheck::ConfirmedAbsent => ResolutionStatus::Absent,
            AbsenceCheck::BytesFound(ref location) => {
                log::debug!("{reference} has no record but bytes exist at {location}");
                ResolutionStatus::Unknown
            }
            AbsenceCheck::Unchecked => ResolutionStatus::Unknown,
        };
        log::debug!("{reference} not found, status {status}");

        let mut target = ResolvedTarget::not_found(Some(status));
        if let AbsenceCheck::BytesFound(location) = answer {
            target.observed_location = Some(location);
        }
        Ok(target)
    }
}

fn describe(identity: &Identity) -> String {
    format!(
        "{}{}",
        identity.file_id(),
        identity.extension().unwrap_or_default()
    )
}

fn collaborator(step: ResolveStep, subject: String, source: CollaboratorError) -> ResolverError {
    log::warn!("{step} failed for {subject}: {source}");
    ResolverError::Collaborator {
        step,
        subject,
        source,
    }
}
