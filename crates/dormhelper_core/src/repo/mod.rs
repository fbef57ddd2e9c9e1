//! Repository layer: one contract per entity plus its SQLite implementation.
//!
//! # Responsibility
//! - Provide the CRUD operations the presentation layer calls.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Write paths validate input before touching SQL.
//! - Multi-statement operations run in one immediate transaction that
//!   commits on success and rolls back on every error path.
//! - Lookups that find nothing return `None`, never an error.

use crate::db::DbError;
use crate::model::handbook::HandbookNodeId;
use crate::model::ValidationError;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod handbook_repo;
pub mod neighbor_repo;
pub mod news_repo;
pub mod request_repo;
pub mod student_repo;

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    /// Persisted row cannot be converted into a valid record.
    InvalidData(String),
    /// Handbook parent id does not reference an existing node.
    ParentNotFound(HandbookNodeId),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::ParentNotFound(id) => write!(f, "handbook parent not found: {id}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
            Self::ParentNotFound(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
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

/// Runs `work` inside one immediate transaction.
///
/// The transaction rolls back when `work` fails, because an uncommitted
/// `Transaction` rolls back on drop.
pub(crate) fn write_tx<T>(
    conn: &Connection,
    work: impl FnOnce(&Transaction<'_>) -> RepoResult<T>,
) -> RepoResult<T> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    let value = work(&tx)?;
    tx.commit()?;
    Ok(value)
}
