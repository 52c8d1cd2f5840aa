//! Document store for retrace
//!
//! Session exports and the response-id to model table live in SQLite. The
//! [`DocumentStore`] trait is the seam the command layer loads sessions
//! through, so a directory of exports works the same as the database.

use std::path::{Path, PathBuf};

use chrono::Utc;
use retrace_chat::{ChatError, ModelLookup, SessionDocument, parse_session_file, parse_session_json};
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::migrations::{self, CURRENT_VERSION, MigrationError};

/// Tables holding stored records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    /// Imported session exports
    ChatLogs,
    /// Model names keyed by response id
    ChatIds,
}

impl Table {
    fn count_query(self) -> &'static str {
        match self {
            Self::ChatLogs => "SELECT COUNT(*) FROM chat_logs",
            Self::ChatIds => "SELECT COUNT(*) FROM chat_ids",
        }
    }
}

/// Document store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(#[from] migrations::MigrationError),

    /// Record not found
    #[error("Record not found: {collection}/{key}")]
    NotFound {
        /// Table or directory that was searched
        collection: String,
        /// The key that has no record
        key: String,
    },

    /// The database has no schema yet
    #[error("Document store is not initialized")]
    Uninitialized,

    /// The stored document is not a valid session
    #[error("Invalid session document: {0}")]
    Chat(#[from] ChatError),
}

/// Loads session documents by key
pub trait DocumentStore {
    /// Fetch and parse the session stored under `key`
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for unknown keys and
    /// [`StoreError::Chat`] when the stored document is malformed.
    fn fetch_session(&self, key: &str) -> Result<SessionDocument, StoreError>;
}

/// SQLite-backed session store
pub struct SessionStore {
    conn: Connection,
}

impl SessionStore {
    /// Create a new in-memory store
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created.
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Open a store file
    ///
    /// # Errors
    ///
    /// Returns an error if the database file cannot be opened.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        debug!(path = %path.display(), "Opened document store");
        Ok(Self { conn })
    }

    /// Open an existing store file without writing to it
    ///
    /// Nothing is migrated; the schema must already be one this build reads.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, has no schema, or was
    /// written by a newer retrace.
    pub fn open_read_only(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        match migrations::get_version(&conn)? {
            0 => return Err(StoreError::Uninitialized),
            found if found > CURRENT_VERSION => {
                return Err(MigrationError::UnsupportedVersion {
                    found,
                    supported: CURRENT_VERSION,
                }
                .into());
            }
            _ => {}
        }
        debug!(path = %path.display(), "Opened document store read-only");
        Ok(Self { conn })
    }

    /// The store at `path` for model lookups, if it exists and is readable
    ///
    /// An unreadable store only costs the model names, so it is logged and
    /// skipped.
    #[must_use]
    pub fn for_model_lookup(path: &Path) -> Option<Self> {
        if !path.is_file() {
            return None;
        }
        match Self::open_read_only(path) {
            Ok(store) => Some(store),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Document store unreadable, model names unavailable");
                None
            }
        }
    }

    /// Initialize the schema using migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be created.
    pub fn initialize(&self) -> Result<(), StoreError> {
        let applied = migrations::migrate(&self.conn)?;
        if !applied.is_empty() {
            info!(versions = ?applied, "Applied document store migrations");
        }
        Ok(())
    }

    /// Check if the schema is initialized and up to date
    pub fn is_initialized(&self) -> bool {
        migrations::is_up_to_date(&self.conn)
    }

    /// Get the current schema version
    ///
    /// # Errors
    ///
    /// Returns an error if the version cannot be read.
    pub fn schema_version(&self) -> Result<i32, StoreError> {
        Ok(migrations::get_version(&self.conn)?)
    }

    /// Count the rows of a table
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count(&self, table: Table) -> Result<i64, StoreError> {
        let count: i64 = self.conn.query_row(table.count_query(), [], |row| row.get(0))?;
        Ok(count)
    }

    /// Store a session export under `key`, replacing any previous one
    ///
    /// The JSON is validated before it is written, so the store only ever
    /// holds documents that parse.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Chat`] for malformed documents, otherwise a
    /// SQLite error if the write fails.
    pub fn put_session(&self, key: &str, json: &str) -> Result<SessionDocument, StoreError> {
        let document = parse_session_json(json)?;
        self.conn.execute(
            "INSERT INTO chat_logs (key, document, imported_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET
                document = excluded.document,
                imported_at = excluded.imported_at",
            params![key, json, Utc::now().to_rfc3339()],
        )?;
        info!(
            key,
            turns = document.request_count(),
            "Stored session document"
        );
        Ok(document)
    }

    /// Keys of every stored session, sorted
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn session_keys(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT key FROM chat_logs ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }

    /// Record the model that produced `response_id`
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn put_model(&self, response_id: &str, model: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO chat_ids (request_id, model) VALUES (?1, ?2)
             ON CONFLICT(request_id) DO UPDATE SET model = excluded.model",
            params![response_id, model],
        )?;
        debug!(response_id, model, "Stored model name");
        Ok(())
    }

    /// Model recorded for `response_id`
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn model(&self, response_id: &str) -> Result<Option<String>, StoreError> {
        let model = self
            .conn
            .query_row(
                "SELECT model FROM chat_ids WHERE request_id = ?1",
                [response_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(model)
    }
}

impl DocumentStore for SessionStore {
    fn fetch_session(&self, key: &str) -> Result<SessionDocument, StoreError> {
        let json: String = self
            .conn
            .query_row(
                "SELECT document FROM chat_logs WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound {
                collection: "chat_logs".to_string(),
                key: key.to_string(),
            })?;
        Ok(parse_session_json(&json)?)
    }
}

impl ModelLookup for SessionStore {
    fn model_for(&self, response_id: &str) -> Option<String> {
        match self.model(response_id) {
            Ok(model) => model,
            Err(e) => {
                warn!(response_id, error = %e, "Model lookup failed");
                None
            }
        }
    }
}

/// Reads session exports stored as `<key>.json` in a directory
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    dir: PathBuf,
}

impl JsonFileSource {
    /// A source rooted at `dir`
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File a key resolves to
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl DocumentStore for JsonFileSource {
    fn fetch_session(&self, key: &str) -> Result<SessionDocument, StoreError> {
        let path = self.path_for(key);
        if !path.is_file() {
            return Err(StoreError::NotFound {
                collection: self.dir.display().to_string(),
                key: key.to_string(),
            });
        }
        Ok(parse_session_file(&path)?)
    }
}
