//! Ledger persistence contracts and SQLite implementation.
//!
//! # Responsibility
//! - Read and replace the serialized record ledger and the user-defined
//!   category list, each stored under one fixed key.
//! - Keep SQL and JSON encoding details inside the persistence boundary.
//!
//! # Invariants
//! - Blobs are written whole; there is no partial update of a stored list.
//! - Read paths reject undecodable persisted state instead of masking it.

use crate::db::DbError;
use crate::model::record::Record;
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Fixed logical key for the serialized record ledger.
const LEDGER_KEY: &str = "fundtab.ledger.v1";
/// Fixed logical key for the serialized user-defined category labels.
const CATEGORY_KEY: &str = "fundtab.categories.v1";

pub type RepoResult<T> = Result<T, RepoError>;

/// Storage-layer error for ledger persistence operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// A persisted blob could not be decoded.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted ledger data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Persistence contract for the durable ledger medium.
///
/// One implementation instance belongs to one execution context; contexts
/// sharing a database file race with last-writer-wins semantics.
pub trait LedgerRepository {
    /// Reads the full ledger; `None` when no ledger was ever persisted.
    fn load_records(&self) -> RepoResult<Option<Vec<Record>>>;
    /// Replaces the persisted ledger with `records`.
    fn save_records(&self, records: &[Record]) -> RepoResult<()>;
    /// Reads user-defined category labels; empty when never persisted.
    fn load_user_categories(&self) -> RepoResult<Vec<String>>;
    /// Replaces the persisted user-defined category labels.
    fn save_user_categories(&self, labels: &[String]) -> RepoResult<()>;
}

/// SQLite-backed ledger repository over the `kv_entries` table.
pub struct SqliteLedgerRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLedgerRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn read_blob(&self, key: &str) -> RepoResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn write_blob(&self, key: &str, value: &str) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO kv_entries (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value;",
            params![key, value],
        )?;
        Ok(())
    }
}

impl LedgerRepository for SqliteLedgerRepository<'_> {
    fn load_records(&self) -> RepoResult<Option<Vec<Record>>> {
        let Some(blob) = self.read_blob(LEDGER_KEY)? else {
            return Ok(None);
        };
        let records = serde_json::from_str(&blob)
            .map_err(|err| RepoError::InvalidData(format!("ledger blob: {err}")))?;
        Ok(Some(records))
    }

    fn save_records(&self, records: &[Record]) -> RepoResult<()> {
        let blob = serde_json::to_string(records)
            .map_err(|err| RepoError::InvalidData(format!("ledger encode: {err}")))?;
        self.write_blob(LEDGER_KEY, &blob)
    }

    fn load_user_categories(&self) -> RepoResult<Vec<String>> {
        let Some(blob) = self.read_blob(CATEGORY_KEY)? else {
            return Ok(Vec::new());
        };
        let labels = serde_json::from_str(&blob)
            .map_err(|err| RepoError::InvalidData(format!("category blob: {err}")))?;
        Ok(labels)
    }

    fn save_user_categories(&self, labels: &[String]) -> RepoResult<()> {
        let blob = serde_json::to_string(labels)
            .map_err(|err| RepoError::InvalidData(format!("category encode: {err}")))?;
        self.write_blob(CATEGORY_KEY, &blob)
    }
}
