//! Database schema management and migrations.
//!
//! This module handles database schema initialization and version checking.

use rusqlite::Connection;

use crate::error::{Error, Result};

use super::schema::{
    CREATE_HEADS_TABLE, CREATE_IDENTITIES_TABLE, CREATE_IDENTITY_KEY_INDEX, CREATE_METADATA_TABLE,
    CREATE_REVISIONS_NO_DELETE_TRIGGER, CREATE_REVISIONS_NO_UPDATE_TRIGGER, CREATE_REVISIONS_TABLE,
    CREATE_REVISION_HASH_INDEX, CURRENT_SCHEMA_VERSION, INSERT_SCHEMA_VERSION,
    SELECT_SCHEMA_VERSION,
};

/// Initializes the database schema.
///
/// Creates all tables, indices, triggers, and the version row for a fresh
/// database.
///
/// # Errors
///
/// Returns an error if any SQL statement fails to execute.
///
/// # Examples
///
/// ```
/// use rusqlite::Connection;
/// use pkms::database::migrations::{get_schema_version, initialize_schema};
///
/// let conn = Connection::open_in_memory().unwrap();
/// initialize_schema(&conn).unwrap();
/// assert_eq!(get_schema_version(&conn).unwrap(), 1);
/// ```
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    for statement in [
        CREATE_METADATA_TABLE,
        CREATE_IDENTITIES_TABLE,
        CREATE_IDENTITY_KEY_INDEX,
        CREATE_REVISIONS_TABLE,
        CREATE_REVISION_HASH_INDEX,
        CREATE_HEADS_TABLE,
        CREATE_REVISIONS_NO_UPDATE_TRIGGER,
        CREATE_REVISIONS_NO_DELETE_TRIGGER,
    ] {
        conn.execute(statement, [])?;
    }

    conn.execute(INSERT_SCHEMA_VERSION, [CURRENT_SCHEMA_VERSION])?;
    log::debug!("initialized index schema version {CURRENT_SCHEMA_VERSION}");

    Ok(())
}

/// Gets the current schema version from the database.
///
/// # Errors
///
/// Returns an error if the query fails for reasons other than a missing
/// metadata table or row (both of which mean version 0).
pub fn get_schema_version(conn: &Connection) -> Result<i32> {
    match conn.query_row(SELECT_SCHEMA_VERSION, [], |row| {
        let value: String = row.get(0)?;
        value
            .parse::<i32>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e)))
    }) {
        Ok(version) => Ok(version),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
        Err(rusqlite::Error::SqliteFailure(_, Some(ref message)))
            if message.contains("no such table") =>
        {
            Ok(0)
        }
        Err(rusqlite::Error::FromSqlConversionFailure(..)) => Err(Error::DatabaseCorruption {
            details: "schema_version is not an integer".into(),
        }),
        Err(e) => Err(e.into()),
    }
}

/// Checks schema compatibility and initializes if needed.
///
/// # Errors
///
/// Returns `UnsupportedSchemaVersion` when the stored version differs
/// from [`CURRENT_SCHEMA_VERSION`], or an error if initialization fails.
///
/// # Examples
///
/// ```
/// use rusqlite::Connection;
/// use pkms::database::migrations::check_schema_compatibility;
///
/// let conn = Connection::open_in_memory().unwrap();
/// check_schema_compatibility(&conn, true).unwrap();
/// ```
pub fn check_schema_compatibility(conn: &Connection, initialize: bool) -> Result<()> {
    let version = get_schema_version(conn)?;

    if version == 0 {
        if !initialize {
            return Err(Error::UnsupportedSchemaVersion {
                expected: CURRENT_SCHEMA_VERSION,
                found: 0,
            });
        }
        initialize_schema(conn)?;
    } else if version != CURRENT_SCHEMA_VERSION {
        return Err(Error::UnsupportedSchemaVersion {
            expected: CURRENT_SCHEMA_VERSION,
            found: version,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_connection() -> Connection {
        Connection::open_in_memory().unwrap()
    }

    #[test]
    fn test_initialize_schema() {
        let conn = create_test_connection();
        initialize_schema(&conn).unwrap();

        assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
        for table in ["identities", "revisions", "heads"] {
            let count: i32 = conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
                .unwrap();
            assert_eq!(count, 0);
        }
    }

    #[test]
    fn test_get_schema_version_uninitialized() {
        let conn = create_test_connection();
        assert_eq!(get_schema_version(&conn).unwrap(), 0);
    }

    #[test]
    fn test_check_schema_compatibility_fresh_database() {
        let conn = create_test_connection();
        check_schema_compatibility(&conn, true).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
        check_schema_compatibility(&conn, false).unwrap();
    }

    #[test]
    fn test_uninitialized_without_init_is_rejected() {
        let conn = create_test_connection();
        let err = check_schema_compatibility(&conn, false).unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedSchemaVersion { found: 0, .. }
        ));
    }

    #[test]
    fn test_check_schema_compatibility_newer_version() {
        let conn = create_test_connection();
        initialize_schema(&conn).unwrap();
        conn.execute(
            "UPDATE metadata SET value = '999' WHERE key = 'schema_version'",
            [],
        )
        .unwrap();

        let err = check_schema_compatibility(&conn, true).unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedSchemaVersion {
                expected: CURRENT_SCHEMA_VERSION,
                found: 999
            }
        ));
    }

    #[test]
    fn test_garbled_version_is_corruption() {
        let conn = create_test_connection();
        initialize_schema(&conn).unwrap();
        conn.execute(
            "UPDATE metadata SET value = 'one' WHERE key = 'schema_version'",
            [],
        )
        .unwrap();
        assert!(matches!(
            get_schema_version(&conn),
            Err(Error::DatabaseCorruption { .. })
        ));
    }

    #[test]
    fn test_schema_creates_triggers_and_indices() {
        let conn = create_test_connection();
        initialize_schema(&conn).unwrap();

        let triggers: i32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'trigger' AND tbl_name = 'revisions'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(triggers, 2);

        let indices: i32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name LIKE 'idx_%'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(indices, 2);
    }
}
