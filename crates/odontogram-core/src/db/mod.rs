//! SQLite record store for dental records.

mod records;
mod schema;

pub use schema::*;

use rusqlite::Connection;
use std::path::Path;
use thiserror::Error;

use crate::config::OdontogramConfig;

/// Errors from the dental record store.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("sections JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No dental record matches the given id or (patient, tooth).
    #[error("dental record not found: {0}")]
    NotFound(String),

    /// A write broke `UNIQUE(patient_id, tooth_number)` or the tooth range check.
    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("invalid dental record row: {0}")]
    InvalidRow(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Connection to the `dental_records` store.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the store at `path`, creating the file and schema if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), "opened dental record database");
        Self::with_schema(conn)
    }

    /// Open the store named by a resolved configuration.
    pub fn from_config(config: &OdontogramConfig) -> DbResult<Self> {
        Self::open(config.database_path())
    }

    /// Throwaway store, used by tests and previews.
    pub fn open_in_memory() -> DbResult<Self> {
        Self::with_schema(Connection::open_in_memory()?)
    }

    fn with_schema(conn: Connection) -> DbResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Raw connection, for queries the record API does not cover.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}
