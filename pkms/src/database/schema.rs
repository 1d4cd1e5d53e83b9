//! Database schema definitions and SQL constants.
//!
//! This module contains the table definitions, indices, and triggers of the
//! identity index. Revisions are append-only; the triggers make any
//! `UPDATE` or `DELETE` on them fail.

/// Current schema version for the database.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// SQL statement to create the metadata table.
pub const CREATE_METADATA_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS metadata (
        key TEXT PRIMARY KEY NOT NULL,
        value TEXT NOT NULL
    )";

/// SQL statement to create the identities table.
///
/// `file_extension` is NULL for identities without an extension.
/// `capabilities` is a JSON array of strings.
pub const CREATE_IDENTITIES_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS identities (
        seq_id INTEGER PRIMARY KEY AUTOINCREMENT,
        file_id TEXT NOT NULL COLLATE NOCASE,
        file_extension TEXT COLLATE NOCASE,
        file_uid TEXT UNIQUE,
        capabilities TEXT NOT NULL DEFAULT '[]',
        registered_at INTEGER NOT NULL
    )";

/// Unique `(file_id, extension)` with NULL and no extension treated alike.
pub const CREATE_IDENTITY_KEY_INDEX: &str = r"
    CREATE UNIQUE INDEX IF NOT EXISTS idx_identities_key
    ON identities(file_id, IFNULL(file_extension, ''))";

/// SQL statement to create the revisions table.
///
/// The location is stored as its parts: `authority` keeps NULL (absent)
/// distinct from `''` (empty), and `segments` is the JSON tuple form
/// (`[null, "a", "b"]` for a rooted path).
pub const CREATE_REVISIONS_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS revisions (
        seq_id INTEGER NOT NULL REFERENCES identities(seq_id),
        revision_id TEXT NOT NULL,
        ordinal INTEGER NOT NULL,
        content_hash TEXT NOT NULL,
        size INTEGER NOT NULL,
        scheme TEXT NOT NULL,
        authority TEXT,
        segments TEXT NOT NULL,
        captured_at TEXT NOT NULL,
        metadata TEXT NOT NULL DEFAULT '{}',
        capabilities TEXT NOT NULL DEFAULT '[]',
        PRIMARY KEY (seq_id, revision_id),
        UNIQUE (seq_id, ordinal)
    )";

/// Index for `sha256` selector lookups.
pub const CREATE_REVISION_HASH_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_revisions_hash ON revisions(content_hash)";

/// SQL statement to create the heads table. A NULL `revision_id` is a
/// detached HEAD.
pub const CREATE_HEADS_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS heads (
        seq_id INTEGER PRIMARY KEY NOT NULL REFERENCES identities(seq_id),
        revision_id TEXT
    )";

/// Rejects updates to revisions.
pub const CREATE_REVISIONS_NO_UPDATE_TRIGGER: &str = r"
    CREATE TRIGGER IF NOT EXISTS revisions_no_update
    BEFORE UPDATE ON revisions
    BEGIN
        SELECT RAISE(ABORT, 'revisions are append-only');
    END";

/// Rejects deletion of revisions.
pub const CREATE_REVISIONS_NO_DELETE_TRIGGER: &str = r"
    CREATE TRIGGER IF NOT EXISTS revisions_no_delete
    BEFORE DELETE ON revisions
    BEGIN
        SELECT RAISE(ABORT, 'revisions are append-only');
    END";

/// SQL statement to select the schema version from the metadata table.
pub const SELECT_SCHEMA_VERSION: &str = "SELECT value FROM metadata WHERE key = 'schema_version'";

/// SQL statement to insert or update the schema version in the metadata table.
pub const INSERT_SCHEMA_VERSION: &str =
    "INSERT OR REPLACE INTO metadata (key, value) VALUES ('schema_version', ?)";
