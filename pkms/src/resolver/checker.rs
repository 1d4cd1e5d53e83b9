//! Existence and integrity checking of revision locations.
//!
//! The resolver asks an [`ExistenceChecker`] whether the bytes behind a
//! location are still there and still match the recorded hash. The trait is
//! the seam for testing: [`FilesystemChecker`] looks at the local disk,
//! [`ScriptedChecker`] answers from a script.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use jwalk::WalkDir;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::config::CheckerConfig;
use crate::error::CollaboratorError;
use crate::identity::ContentHash;
use crate::location::{FileLocation, PathTarget};
use crate::selector::{LookupField, Reference};

const FILESYSTEM_CHECKER: &str = "filesystem checker";
const EXISTENCE_CHECKER: &str = "existence checker";

/// Whether bytes are at the checked location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    /// Bytes are at the location.
    Present,
    /// Bytes were moved to a reversible holding area.
    Trashed,
    /// Bytes were found elsewhere under a vault root.
    Moved,
    /// Bytes are not at the location or in a holding area, and no complete
    /// search of the vault roots was possible.
    Unlocated,
    /// A completed search found the bytes nowhere.
    Missing,
}

/// Whether present bytes match the expected hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HashMatch {
    /// The observed hash equals the expected one.
    Matches,
    /// The observed hash differs.
    Mismatch,
    /// The hash was not (or could not be) computed.
    Unknown,
}

/// What a checker observed at a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    /// Presence of the bytes.
    pub presence: Presence,
    /// Integrity of the bytes, meaningful only when present.
    pub hash_match: HashMatch,
    /// The hash actually computed, if any.
    pub observed_hash: Option<ContentHash>,
    /// Where the bytes were found, if not at the checked location.
    pub observed_location: Option<FileLocation>,
}

impl CheckReport {
    /// Bytes present and matching.
    #[must_use]
    pub fn matching(hash: ContentHash) -> Self {
        Self {
            presence: Presence::Present,
            hash_match: HashMatch::Matches,
            observed_hash: Some(hash),
            observed_location: None,
        }
    }

    /// Bytes present but hashing to `observed`.
    #[must_use]
    pub fn mismatch(observed: ContentHash) -> Self {
        Self {
            presence: Presence::Present,
            hash_match: HashMatch::Mismatch,
            observed_hash: Some(observed),
            observed_location: None,
        }
    }

    /// Bytes present, integrity not verified.
    #[must_use]
    pub const fn unverified() -> Self {
        Self {
            presence: Presence::Present,
            hash_match: HashMatch::Unknown,
            observed_hash: None,
            observed_location: None,
        }
    }

    /// Bytes found in a holding area.
    #[must_use]
    pub const fn trashed(observed_location: Option<FileLocation>) -> Self {
        Self {
            presence: Presence::Trashed,
            hash_match: HashMatch::Unknown,
            observed_hash: None,
            observed_location,
        }
    }

    /// Bytes found away from the checked location.
    #[must_use]
    pub const fn moved(observed_location: FileLocation, observed_hash: Option<ContentHash>) -> Self {
        Self {
            presence: Presence::Moved,
            hash_match: HashMatch::Unknown,
            observed_hash,
            observed_location: Some(observed_location),
        }
    }

    /// Bytes not found, search incomplete.
    #[must_use]
    pub const fn unlocated() -> Self {
        Self {
            presence: Presence::Unlocated,
            hash_match: HashMatch::Unknown,
            observed_hash: None,
            observed_location: None,
        }
    }

    /// Bytes gone.
    #[must_use]
    pub const fn missing() -> Self {
        Self {
            presence: Presence::Missing,
            hash_match: HashMatch::Unknown,
            observed_hash: None,
            observed_location: None,
        }
    }
}

/// Result of asking whether any bytes exist for an unregistered reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsenceCheck {
    /// A completed search found no bytes.
    ConfirmedAbsent,
    /// Bytes exist even though no record does.
    BytesFound(FileLocation),
    /// No search was performed or it could not complete.
    Unchecked,
}

/// Trait for checking whether a location still holds the expected bytes.
///
/// Implementations are shared by concurrent resolutions and must be
/// thread-safe.
pub trait ExistenceChecker: Send + Sync {
    /// Checks `location` against `expected`.
    ///
    /// # Errors
    ///
    /// Returns a `CollaboratorError` when the check cannot be performed,
    /// never to signal that the bytes are missing.
    fn check(
        &self,
        location: &FileLocation,
        expected: &ContentHash,
    ) -> Result<CheckReport, CollaboratorError>;

    /// Searches for bytes belonging to a reference with no record.
    ///
    /// The default performs no search and reports `Unchecked`.
    ///
    /// # Errors
    ///
    /// Returns a `CollaboratorError` when the search fails.
    fn confirm_absence(&self, _reference: &Reference) -> Result<AbsenceCheck, CollaboratorError> {
        Ok(AbsenceCheck::Unchecked)
    }
}

impl<C: ExistenceChecker + ?Sized> ExistenceChecker for Arc<C> {
    fn check(
        &self,
        location: &FileLocation,
        expected: &ContentHash,
    ) -> Result<CheckReport, CollaboratorError> {
        (**self).check(location, expected)
    }

    fn confirm_absence(&self, reference: &Reference) -> Result<AbsenceCheck, CollaboratorError> {
        (**self).confirm_absence(reference)
    }
}

/// Runtime parameters of a [`FilesystemChecker`].
///
/// Derived from `CheckerConfig`, with defaults filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilesystemCheckConfig {
    /// Hash present files and compare against the recorded hash.
    pub verify_hash: bool,
    /// Holding areas; relative entries are looked up in every ancestor of
    /// the checked file.
    pub trash_dirs: Vec<PathBuf>,
    /// Roots searched for moved files and when confirming absence.
    pub vault_roots: Vec<PathBuf>,
}

impl Default for FilesystemCheckConfig {
    fn default() -> Self {
        Self {
            verify_hash: true,
            trash_dirs: vec![PathBuf::from(".trash")],
            vault_roots: Vec::new(),
        }
    }
}

impl From<&CheckerConfig> for FilesystemCheckConfig {
    fn from(config: &CheckerConfig) -> Self {
        let defaults = Self::default();
        Self {
            verify_hash: config.verify_hash.unwrap_or(defaults.verify_hash),
            trash_dirs: config.trash_dirs.clone().unwrap_or(defaults.trash_dirs),
            vault_roots: config.vault_roots.clone().unwrap_or_default(),
        }
    }
}

/// Checker backed by the local filesystem.
///
/// Only `file` locations projectable to the native path convention are
/// supported. Hashes are SHA-256, hex encoded.
///
/// # Examples
///
/// ```
/// use pkms::identity::ContentHash;
/// use pkms::location::FileLocation;
/// use pkms::resolver::{ExistenceChecker, FilesystemChecker, Presence};
///
/// let checker = FilesystemChecker::default();
/// let location = FileLocation::from_uri("file:///definitely/not/here.md").unwrap();
/// let report = checker.check(&location, &ContentHash::new("00").unwrap()).unwrap();
/// // No vault roots are configured, so the file cannot be declared gone
/// assert_eq!(report.presence, Presence::Unlocated);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FilesystemChecker {
    config: FilesystemCheckConfig,
}

impl FilesystemChecker {
    /// Creates a checker with explicit parameters.
    #[must_use]
    pub const fn new(config: FilesystemCheckConfig) -> Self {
        Self { config }
    }

    /// The checker parameters.
    #[must_use]
    pub const fn config(&self) -> &FilesystemCheckConfig {
        &self.config
    }

    fn local_path(location: &FileLocation) -> Result<PathBuf, CollaboratorError> {
        if !location.scheme().eq_ignore_ascii_case("file") {
            return Err(CollaboratorError::Unsupported {
                collaborator: FILESYSTEM_CHECKER,
                reason: format!("scheme '{}'", location.scheme()),
            });
        }
        location
            .to_filesystem_path(PathTarget::native())
            .map(PathBuf::from)
            .map_err(|err| CollaboratorError::Unsupported {
                collaborator: FILESYSTEM_CHECKER,
                reason: err.to_string(),
            })
    }

    fn io_error(path: &Path, source: io::Error) -> CollaboratorError {
        CollaboratorError::Io {
            collaborator: FILESYSTEM_CHECKER,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Whether the bytes at `path` may stand in for `expected`.
    ///
    /// Without hash verification any regular file qualifies.
    fn accepts(&self, path: &Path, expected: &ContentHash) -> io::Result<bool> {
        if !self.config.verify_hash {
            return Ok(true);
        }
        let observed = sha256_file(path)?;
        Ok(observed.eq_ignore_ascii_case(expected.as_str()))
    }

    fn find_in_trash(
        &self,
        path: &Path,
        expected: &ContentHash,
    ) -> Result<Option<PathBuf>, CollaboratorError> {
        let Some(file_name) = path.file_name() else {
            return Ok(None);
        };

        for trash in &self.config.trash_dirs {
            let candidates: Vec<PathBuf> = if trash.is_absolute() {
                vec![trash.join(file_name)]
            } else {
                path.ancestors()
                    .skip(1)
                    .map(|ancestor| ancestor.join(trash).join(file_name))
                    .collect()
            };
            for candidate in candidates {
                match fs::metadata(&candidate) {
                    Ok(metadata) if metadata.is_file() => {
                        let accepted = self
                            .accepts(&candidate, expected)
                            .map_err(|err| Self::io_error(&candidate, err))?;
                        if accepted {
                            return Ok(Some(candidate));
                        }
                        log::debug!("{} has the same name but other bytes", candidate.display());
                    }
                    Ok(_) => {}
                    Err(err) if is_absent(&err) => {}
                    Err(err) => return Err(Self::io_error(&candidate, err)),
                }
            }
        }
        Ok(None)
    }

    /// Walks every vault root for a regular file named `target`
    /// (case-insensitive) that `accept` approves.
    fn search_vaults<F>(&self, target: &str, mut accept: F) -> VaultSearch
    where
        F: FnMut(&Path) -> io::Result<bool>,
    {
        if self.config.vault_roots.is_empty() {
            return VaultSearch::Incomplete;
        }

        for root in &self.config.vault_roots {
            if !root.is_dir() {
                log::warn!("vault root {} is not a directory, search incomplete", root.display());
                return VaultSearch::Incomplete;
            }
            for entry in WalkDir::new(root).skip_hidden(false) {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(err) => {
                        log::warn!("walk of {} incomplete: {err}", root.display());
                        return VaultSearch::Incomplete;
                    }
                };
                let name_matches = entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| name.eq_ignore_ascii_case(target));
                if !(entry.file_type().is_file() && name_matches) {
                    continue;
                }
                let path = entry.path();
                match accept(&path) {
                    Ok(true) => return VaultSearch::Found(path),
                    Ok(false) => {}
                    Err(err) => {
                        log::warn!("cannot read {}: {err}", path.display());
                        return VaultSearch::Incomplete;
                    }
                }
            }
        }
        VaultSearch::NotFound
    }

    /// Settles a file that is not at its recorded path.
    fn locate_elsewhere(
        &self,
        path: &Path,
        expected: &ContentHash,
    ) -> Result<CheckReport, CollaboratorError> {
        if let Some(found) = self.find_in_trash(path, expected)? {
            return Ok(CheckReport::trashed(native_location(&found)));
        }

        let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
            return Ok(CheckReport::unlocated());
        };
        let search = self.search_vaults(file_name, |candidate| {
            Ok(candidate != path && self.accepts(candidate, expected)?)
        });
        let observed_hash = self.config.verify_hash.then(|| expected.clone());

        Ok(match search {
            VaultSearch::Found(found) => match native_location(&found) {
                Some(location) => {
                    log::debug!("{} moved to {}", path.display(), found.display());
                    CheckReport::moved(location, observed_hash)
                }
                None => CheckReport::unlocated(),
            },
            VaultSearch::NotFound => CheckReport::missing(),
            VaultSearch::Incomplete => CheckReport::unlocated(),
        })
    }
}

/// Outcome of walking the vault roots.
enum VaultSearch {
    Found(PathBuf),
    NotFound,
    Incomplete,
}

fn native_location(path: &Path) -> Option<FileLocation> {
    path.to_str()
        .and_then(|p| FileLocation::from_filesystem_path(p, PathTarget::native()).ok())
}

impl ExistenceChecker for FilesystemChecker {
    fn check(
        &self,
        location: &FileLocation,
        expected: &ContentHash,
    ) -> Result<CheckReport, CollaboratorError> {
        let path = Self::local_path(location)?;

        match fs::metadata(&path) {
            Ok(metadata) if metadata.is_file() => {
                if !self.config.verify_hash {
                    return Ok(CheckReport::unverified());
                }
                let observed = sha256_file(&path).map_err(|err| Self::io_error(&path, err))?;
                let observed = ContentHash::new(&observed).map_err(|err| {
                    CollaboratorError::Unavailable {
                        collaborator: FILESYSTEM_CHECKER,
                        reason: err.to_string(),
                    }
                })?;
                if &observed == expected {
                    Ok(CheckReport::matching(observed))
                } else {
                    Ok(CheckReport::mismatch(observed))
                }
            }
            Ok(_) => {
                log::debug!("{} is not a regular file", path.display());
                self.locate_elsewhere(&path, expected)
            }
            Err(err) if is_absent(&err) => self.locate_elsewhere(&path, expected),
            Err(err) => Err(Self::io_error(&path, err)),
        }
    }

    fn confirm_absence(&self, reference: &Reference) -> Result<AbsenceCheck, CollaboratorError> {
        if reference.selector().kind().field() != LookupField::FileId {
            return Ok(AbsenceCheck::Unchecked);
        }

        let target = format!(
            "{}{}",
            reference.selector().value(),
            reference.extension().unwrap_or_default()
        );

        Ok(match self.search_vaults(&target, |_| Ok(true)) {
            VaultSearch::Found(path) => {
                native_location(&path).map_or(AbsenceCheck::Unchecked, AbsenceCheck::BytesFound)
            }
            VaultSearch::NotFound => AbsenceCheck::ConfirmedAbsent,
            VaultSearch::Incomplete => AbsenceCheck::Unchecked,
        })
    }
}

fn is_absent(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::NotFound
}

/// Streams a file through SHA-256 and returns the lowercase hex digest.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be read.
pub fn sha256_file(path: &Path) -> io::Result<String> {
    let mut reader = BufReader::with_capacity(64 * 1024, File::open(path)?);
    let mut hasher = Sha256::new();
    io::copy(&mut reader, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Imposes a deadline on every call into an inner checker.
///
/// Each call runs on a helper thread. When the deadline passes the call
/// returns `CollaboratorError::Timeout` and the helper thread is left to
/// finish on its own; its answer is discarded.
#[derive(Debug)]
pub struct TimeoutChecker<C> {
    inner: Arc<C>,
    timeout: Duration,
}

impl<C> TimeoutChecker<C> {
    /// Wraps `inner` with a per-call `timeout`.
    pub fn new(inner: C, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(inner),
            timeout,
        }
    }

    /// The per-call deadline.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    fn run<T, F>(&self, job: F) -> Result<T, CollaboratorError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, CollaboratorError> + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel();
        thread::Builder::new()
            .name("pkms-check".into())
            .spawn(move || {
                // The receiver is gone if the caller already timed out
                let _ = sender.send(job());
            })
            .map_err(|err| CollaboratorError::Unavailable {
                collaborator: EXISTENCE_CHECKER,
                reason: format!("cannot spawn check thread: {err}"),
            })?;

        match receiver.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => Err(CollaboratorError::Timeout {
                collaborator: EXISTENCE_CHECKER,
                elapsed: self.timeout,
            }),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(CollaboratorError::Unavailable {
                collaborator: EXISTENCE_CHECKER,
                reason: "check thread panicked".into(),
            }),
        }
    }
}

impl<C: ExistenceChecker + 'static> ExistenceChecker for TimeoutChecker<C> {
    fn check(
        &self,
        location: &FileLocation,
        expected: &ContentHash,
    ) -> Result<CheckReport, CollaboratorError> {
        let inner = Arc::clone(&self.inner);
        let location = location.clone();
        let expected = expected.clone();
        self.run(move || inner.check(&location, &expected))
    }

    fn confirm_absence(&self, reference: &Reference) -> Result<AbsenceCheck, CollaboratorError> {
        let inner = Arc::clone(&self.inner);
        let reference = reference.clone();
        self.run(move || inner.confirm_absence(&reference))
    }
}

/// Failure a [`ScriptedChecker`] raises for a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptedFailure {
    /// Raise `CollaboratorError::Timeout`.
    Timeout,
    /// Raise `CollaboratorError::Io` with a permission error.
    PermissionDenied,
}

/// Checker that answers from a script, for testing.
///
/// Locations without a scripted report are `Missing`. Calls are counted so
/// tests can assert that no retries happen.
///
/// # Examples
///
/// ```
/// use pkms::identity::ContentHash;
/// use pkms::location::FileLocation;
/// use pkms::resolver::{CheckReport, ExistenceChecker, Presence, ScriptedChecker};
///
/// let location = FileLocation::from_uri("file:///vault/a.md").unwrap();
/// let hash = ContentHash::new("deadbeef").unwrap();
/// let checker = ScriptedChecker::new().with_report(location.clone(), CheckReport::matching(hash.clone()));
///
/// assert_eq!(checker.check(&location, &hash).unwrap().presence, Presence::Present);
/// assert_eq!(checker.calls(), 1);
/// ```
#[derive(Debug, Default)]
pub struct ScriptedChecker {
    reports: HashMap<FileLocation, CheckReport>,
    failures: HashMap<FileLocation, ScriptedFailure>,
    absence: HashMap<String, AbsenceCheck>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedChecker {
    /// Creates a checker that reports every location missing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the report for a location.
    #[must_use]
    pub fn with_report(mut self, location: FileLocation, report: CheckReport) -> Self {
        self.reports.insert(location, report);
        self
    }

    /// Scripts a failure for a location.
    #[must_use]
    pub fn with_failure(mut self, location: FileLocation, failure: ScriptedFailure) -> Self {
        self.failures.insert(location, failure);
        self
    }

    /// Scripts the absence answer for a reference.
    #[must_use]
    pub fn with_absence(mut self, reference: &Reference, answer: AbsenceCheck) -> Self {
        self.absence.insert(reference.to_uri(), answer);
        self
    }

    /// Sleeps before answering each call.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Replaces the report for a location.
    pub fn set_report(&mut self, location: FileLocation, report: CheckReport) {
        self.reports.insert(location, report);
    }

    /// Number of `check` and `confirm_absence` calls so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
    }
}

impl ExistenceChecker for ScriptedChecker {
    fn check(
        &self,
        location: &FileLocation,
        _expected: &ContentHash,
    ) -> Result<CheckReport, CollaboratorError> {
        self.enter();
        match self.failures.get(location) {
            Some(ScriptedFailure::Timeout) => Err(CollaboratorError::Timeout {
                collaborator: EXISTENCE_CHECKER,
                elapsed: self.delay.unwrap_or_default(),
            }),
            Some(ScriptedFailure::PermissionDenied) => Err(CollaboratorError::Io {
                collaborator: EXISTENCE_CHECKER,
                path: PathBuf::from(location.to_uri()),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "scripted failure"),
            }),
            None => Ok(self
                .reports
                .get(location)
                .cloned()
                .unwrap_or_else(CheckReport::missing)),
        }
    }

    fn confirm_absence(&self, reference: &Reference) -> Result<AbsenceCheck, CollaboratorError> {
        self.enter();
        Ok(self
            .absence
            .get(&reference.to_uri())
            .cloned()
            .unwrap_or(AbsenceCheck::Unchecked))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn location_of(path: &Path) -> FileLocation {
        FileLocation::from_filesystem_path(path.to_str().unwrap(), PathTarget::native()).unwrap()
    }

    fn hash_of(bytes: &[u8]) -> ContentHash {
        ContentHash::new(&hex::encode(Sha256::digest(bytes))).unwrap()
    }

    #[test]
    fn test_sha256_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.md");
        fs::write(&path, b"abc").unwrap();
        assert_eq!(
            sha256_file(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_present_and_matching() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.md");
        fs::write(&path, b"hello").unwrap();
        let expected = hash_of(b"hello");

        let report = FilesystemChecker::default()
            .check(&location_of(&path), &expected)
            .unwrap();
        assert_eq!(report.presence, Presence::Present);
        assert_eq!(report.hash_match, HashMatch::Matches);
        assert_eq!(report.observed_hash, Some(expected));
    }

    #[test]
    fn test_present_with_mismatch() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.md");
        fs::write(&path, b"changed").unwrap();

        let report = FilesystemChecker::default()
            .check(&location_of(&path), &hash_of(b"original"))
            .unwrap();
        assert_eq!(report.hash_match, HashMatch::Mismatch);
        assert_eq!(report.observed_hash, Some(hash_of(b"changed")));
    }

    #[test]
    fn test_present_without_verification() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.md");
        fs::write(&path, b"x").unwrap();
        let checker = FilesystemChecker::new(FilesystemCheckConfig {
            verify_hash: false,
            ..FilesystemCheckConfig::default()
        });
        let report = checker.check(&location_of(&path), &hash_of(b"y")).unwrap();
        assert_eq!(report, CheckReport::unverified());
    }

    fn with_vault(root: &Path) -> FilesystemChecker {
        FilesystemChecker::new(FilesystemCheckConfig {
            vault_roots: vec![root.to_path_buf()],
            ..FilesystemCheckConfig::default()
        })
    }

    #[test]
    fn test_missing_needs_a_completed_search() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gone.md");

        let report = FilesystemChecker::default()
            .check(&location_of(&path), &hash_of(b""))
            .unwrap();
        assert_eq!(report, CheckReport::unlocated());

        let report = with_vault(dir.path())
            .check(&location_of(&path), &hash_of(b""))
            .unwrap();
        assert_eq!(report, CheckReport::missing());

        let report = with_vault(&dir.path().join("no-such-root"))
            .check(&location_of(&path), &hash_of(b""))
            .unwrap();
        assert_eq!(report.presence, Presence::Unlocated);
    }

    #[test]
    fn test_moved_within_vault() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("archive");
        fs::create_dir_all(&archive).unwrap();
        fs::write(archive.join("A.md"), b"hello").unwrap();
        let recorded = dir.path().join("journal").join("a.md");

        let report = with_vault(dir.path())
            .check(&location_of(&recorded), &hash_of(b"hello"))
            .unwrap();
        assert_eq!(report.presence, Presence::Moved);
        assert_eq!(report.observed_location, Some(location_of(&archive.join("A.md"))));
        assert_eq!(report.observed_hash, Some(hash_of(b"hello")));

        // Same name, other bytes
        let report = with_vault(dir.path())
            .check(&location_of(&recorded), &hash_of(b"other"))
            .unwrap();
        assert_eq!(report, CheckReport::missing());
    }

    #[test]
    fn test_moved_without_verification_matches_by_name() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.md"), b"anything").unwrap();
        let checker = FilesystemChecker::new(FilesystemCheckConfig {
            verify_hash: false,
            vault_roots: vec![dir.path().to_path_buf()],
            ..FilesystemCheckConfig::default()
        });

        let report = checker
            .check(&location_of(&dir.path().join("sub").join("a.md")), &hash_of(b"x"))
            .unwrap();
        assert_eq!(report.presence, Presence::Moved);
        assert_eq!(report.observed_hash, None);
    }

    #[test]
    fn test_trashed_in_ancestor() {
        let dir = tempdir().unwrap();
        let notes = dir.path().join("notes");
        fs::create_dir_all(&notes).unwrap();
        fs::create_dir_all(dir.path().join(".trash")).unwrap();
        fs::write(dir.path().join(".trash").join("a.md"), b"x").unwrap();

        let report = FilesystemChecker::default()
            .check(&location_of(&notes.join("a.md")), &hash_of(b"x"))
            .unwrap();
        assert_eq!(report.presence, Presence::Trashed);
        let observed = report.observed_location.unwrap();
        assert_eq!(observed.segments().names().last().unwrap(), "a.md");
    }

    #[test]
    fn test_trash_candidate_must_match_hash() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".trash")).unwrap();
        fs::write(dir.path().join(".trash").join("a.md"), b"unrelated").unwrap();
        let recorded = location_of(&dir.path().join("a.md"));

        let report = FilesystemChecker::default()
            .check(&recorded, &hash_of(b"original"))
            .unwrap();
        assert_eq!(report.presence, Presence::Unlocated);

        let unverified = FilesystemChecker::new(FilesystemCheckConfig {
            verify_hash: false,
            ..FilesystemCheckConfig::default()
        });
        let report = unverified.check(&recorded, &hash_of(b"original")).unwrap();
        assert_eq!(report.presence, Presence::Trashed);
    }

    #[test]
    fn test_trashed_in_absolute_dir() {
        let dir = tempdir().unwrap();
        let bin = dir.path().join("bin");
        fs::create_dir_all(&bin).unwrap();
        fs::write(bin.join("a.md"), b"x").unwrap();
        let checker = FilesystemChecker::new(FilesystemCheckConfig {
            trash_dirs: vec![bin],
            ..FilesystemCheckConfig::default()
        });
        let report = checker
            .check(&location_of(&dir.path().join("vault").join("a.md")), &hash_of(b"x"))
            .unwrap();
        assert_eq!(report.presence, Presence::Trashed);
    }

    #[test]
    fn test_unsupported_scheme() {
        let location = FileLocation::from_uri("https://example.com/a.md").unwrap();
        let err = FilesystemChecker::default()
            .check(&location, &hash_of(b""))
            .unwrap_err();
        assert!(matches!(err, CollaboratorError::Unsupported { .. }));
    }

    #[test]
    fn test_confirm_absence_walks_vault_roots() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("journal").join("2024");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("2024-01-01-0001.md"), b"x").unwrap();
        let checker = FilesystemChecker::new(FilesystemCheckConfig {
            vault_roots: vec![dir.path().to_path_buf()],
            ..FilesystemCheckConfig::default()
        });

        let found = Reference::new("id", "2024-01-01-0001", Some(".md")).unwrap();
        assert!(matches!(
            checker.confirm_absence(&found).unwrap(),
            AbsenceCheck::BytesFound(_)
        ));

        let absent = Reference::new("id", "2024-01-01-0002", Some(".md")).unwrap();
        assert_eq!(
            checker.confirm_absence(&absent).unwrap(),
            AbsenceCheck::ConfirmedAbsent
        );
    }

    #[test]
    fn test_confirm_absence_unchecked_without_roots() {
        let reference = Reference::new("id", "x", Some(".md")).unwrap();
        assert_eq!(
            FilesystemChecker::default().confirm_absence(&reference).unwrap(),
            AbsenceCheck::Unchecked
        );
        let dir = tempdir().unwrap();
        let checker = FilesystemChecker::new(FilesystemCheckConfig {
            vault_roots: vec![dir.path().join("missing-root")],
            ..FilesystemCheckConfig::default()
        });
        assert_eq!(checker.confirm_absence(&reference).unwrap(), AbsenceCheck::Unchecked);
        let uid = Reference::new("uid", "x", None).unwrap();
        assert_eq!(checker.confirm_absence(&uid).unwrap(), AbsenceCheck::Unchecked);
    }

    #[test]
    fn test_timeout_checker_times_out() {
        let location = FileLocation::from_uri("file:///a.md").unwrap();
        let slow = ScriptedChecker::new().with_delay(Duration::from_millis(500));
        let checker = TimeoutChecker::new(slow, Duration::from_millis(20));
        let err = checker.check(&location, &hash_of(b"")).unwrap_err();
        assert!(err.is_timeout());
    }

    #[test]
    fn test_timeout_checker_passes_answers_through() {
        let location = FileLocation::from_uri("file:///a.md").unwrap();
        let inner = ScriptedChecker::new()
            .with_report(location.clone(), CheckReport::unverified());
        let checker = TimeoutChecker::new(inner, Duration::from_secs(5));
        assert_eq!(
            checker.check(&location, &hash_of(b"")).unwrap(),
            CheckReport::unverified()
        );
    }

    #[test]
    fn test_scripted_failures() {
        let location = FileLocation::from_uri("file:///a.md").unwrap();
        let checker = ScriptedChecker::new()
            .with_failure(location.clone(), ScriptedFailure::PermissionDenied);
        let err = checker.check(&location, &hash_of(b"")).unwrap_err();
        assert!(matches!(err, CollaboratorError::Io { .. }));
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_config_conversion() {
        let config = CheckerConfig {
            verify_hash: Some(false),
            trash_dirs: None,
            vault_roots: Some(vec![PathBuf::from("/vault")]),
            timeout_ms: None,
        };
        let runtime = FilesystemCheckConfig::from(&config);
        assert!(!runtime.verify_hash);
        assert_eq!(runtime.trash_dirs, vec![PathBuf::from(".trash")]);
        assert_eq!(runtime.vault_roots, vec![PathBuf::from("/vault")]);
    }
}
