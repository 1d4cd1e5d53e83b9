//! Common test utilities for CLI integration tests.
//!
//! [`TestEnv`] provides an isolated workspace and vault, and records notes
//! in the index through the library's ingestion API so the binary has
//! something to resolve.

use assert_cmd::Command;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use pkms::identity::{ContentHash, FileId, FileUid, Revision, RevisionId};
use pkms::resolver::sha256_file;
use pkms::{Database, DatabaseConfig, FileLocation, PathTarget};

/// Environment variables the binary reads; cleared for every command.
const PKMS_ENV: &[&str] = &[
    "PKMS_WORKSPACE_DIR",
    "PKMS_LOG_MODE",
    "PKMS_VERIFY_HASH",
    "PKMS_TRASH_DIRS",
    "PKMS_VAULT_ROOTS",
    "PKMS_CHECK_TIMEOUT_MS",
    "PKMS_BUSY_TIMEOUT_MS",
    "PKMS_INCLUDE_STATUS",
    "PKMS_OUTPUT_FORMAT",
];

/// Test environment with an isolated workspace and vault.
pub struct TestEnv {
    /// Temporary directory (kept alive for the duration of the test)
    #[allow(dead_code)]
    temp_dir: TempDir,
    /// Path to the temporary directory
    pub temp_path: PathBuf,
    /// Path to the pkms workspace directory (not created yet)
    pub workspace: PathBuf,
    /// Path to the vault holding note files
    pub vault: PathBuf,
}

#[allow(dead_code)]
impl TestEnv {
    /// Create a new test environment with an empty vault directory.
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let temp_path = temp_dir.path().to_path_buf();
        let workspace = temp_path.join("pkms-workspace");
        let vault = temp_path.join("vault");
        fs::create_dir_all(&vault).expect("Failed to create vault");

        Self {
            temp_dir,
            temp_path,
            workspace,
            vault,
        }
    }

    /// Command builder with no pkms flags and a clean environment.
    ///
    /// The working directory is the temp dir so no stray project
    /// configuration is discovered.
    pub fn command_bare(&self) -> Command {
        let mut cmd = Command::cargo_bin("pkms").expect("Failed to find pkms binary");
        for var in PKMS_ENV {
            cmd.env_remove(var);
        }
        cmd.current_dir(&self.temp_path);
        cmd
    }

    /// Command builder with `--workspace-dir` pointing at this environment.
    pub fn command(&self) -> Command {
        let mut cmd = self.command_bare();
        cmd.arg("--workspace-dir").arg(&self.workspace);
        cmd
    }

    /// Runs `pkms init` for the workspace.
    pub fn init(&self) {
        self.command().arg("init").arg("--quiet").assert().success();
    }

    pub fn db_path(&self) -> PathBuf {
        self.workspace.join("index.db")
    }

    /// Path of a vault-relative file.
    pub fn note_path(&self, relative: &str) -> PathBuf {
        self.vault.join(relative)
    }

    /// Writes a vault file, creating parent directories.
    pub fn write_note(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.note_path(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    /// Writes a note and records it as the first revision of a new identity.
    pub fn record_note(&self, file_id: &str, uid: Option<&str>, relative: &str, contents: &str) {
        let path = self.write_note(relative, contents);
        let mut db = Database::open(DatabaseConfig::new(self.db_path())).unwrap();
        let uid = uid.map(|uid| FileUid::new(uid).unwrap());
        let extension = Path::new(relative)
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()));
        let identity = db
            .register_identity(
                &FileId::new(file_id).unwrap(),
                extension.as_deref(),
                uid.as_ref(),
                &BTreeSet::new(),
            )
            .unwrap();
        let revision = Revision::builder(
            RevisionId::new("r1").unwrap(),
            hash_of(&path),
            location_of(&path),
        )
        .size(contents.len() as u64)
        .build()
        .unwrap();
        db.append_revision(identity.seq_id(), &revision).unwrap();
    }

    /// Writes a workspace `config.yaml`.
    pub fn write_workspace_config(&self, contents: &str) {
        fs::create_dir_all(&self.workspace).unwrap();
        fs::write(self.workspace.join("config.yaml"), contents).unwrap();
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// The `file` location of a local path.
#[allow(dead_code)]
pub fn location_of(path: &Path) -> FileLocation {
    FileLocation::from_filesystem_path(path.to_str().unwrap(), PathTarget::Posix).unwrap()
}

/// SHA-256 of a local file.
#[allow(dead_code)]
pub fn hash_of(path: &Path) -> ContentHash {
    ContentHash::new(&sha256_file(path).unwrap()).unwrap()
}

/// Parses command stdout as JSON.
#[allow(dead_code)]
pub fn json_of(output: &[u8]) -> serde_json::Value {
    serde_json::from_slice(output).expect("Output is not valid JSON")
}
