//! Document store migrations for retrace
//!
//! This module provides schema migration functionality, allowing the store
//! schema to evolve over time while keeping existing databases readable.

use chrono::Utc;
use rusqlite::{Connection, params};
use thiserror::Error;

/// Migration errors
#[derive(Debug, Error)]
pub enum MigrationError {
    /// SQLite error during migration
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The database was written by a newer retrace
    #[error("Database schema version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version recorded in the database
        found: i32,
        /// Highest version this build understands
        supported: i32,
    },
}

/// Current schema version
pub const CURRENT_VERSION: i32 = 1;

/// A schema migration
pub struct Migration {
    /// Migration version number
    pub version: i32,
    /// Migration name/description
    pub name: &'static str,
    /// SQL to apply the migration
    pub up: &'static str,
}

/// All available migrations in order
pub static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    up: r#"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL
        );

        -- Imported session exports, stored verbatim
        CREATE TABLE IF NOT EXISTS chat_logs (
            key TEXT PRIMARY KEY,
            document TEXT NOT NULL,
            imported_at TEXT NOT NULL
        );

        -- Model names keyed by response id
        CREATE TABLE IF NOT EXISTS chat_ids (
            request_id TEXT PRIMARY KEY,
            model TEXT NOT NULL
        );
    "#,
}];

/// Get the current schema version from the database
///
/// Returns 0 if no migrations have been applied.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_version(conn: &Connection) -> Result<i32, MigrationError> {
    let table_exists: i32 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='schema_migrations'",
        [],
        |row| row.get(0),
    )?;

    if table_exists == 0 {
        return Ok(0);
    }

    let version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    Ok(version)
}

/// Apply all pending migrations
///
/// Returns the versions that were applied, empty when already up to date.
///
/// # Errors
///
/// Returns an error if any migration fails or the database is newer than
/// this build understands.
pub fn migrate(conn: &Connection) -> Result<Vec<i32>, MigrationError> {
    let current_version = get_version(conn)?;
    if current_version > CURRENT_VERSION {
        return Err(MigrationError::UnsupportedVersion {
            found: current_version,
            supported: CURRENT_VERSION,
        });
    }

    let mut applied = Vec::new();
    for migration in MIGRATIONS {
        if migration.version > current_version {
            apply_migration(conn, migration)?;
            applied.push(migration.version);
        }
    }

    Ok(applied)
}

/// Apply a single migration and record it in `schema_migrations`
///
/// # Errors
///
/// Returns an error if the migration fails; nothing is committed then.
pub fn apply_migration(conn: &Connection, migration: &Migration) -> Result<(), MigrationError> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(migration.up)?;
    tx.execute(
        "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
        params![migration.version, migration.name, Utc::now().to_rfc3339()],
    )?;
    tx.commit()?;
    Ok(())
}

/// Check if the database is up to date
#[must_use]
pub fn is_up_to_date(conn: &Connection) -> bool {
    get_version(conn)
        .map(|v| v >= CURRENT_VERSION)
        .unwrap_or(false)
}
