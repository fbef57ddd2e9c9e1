//! SQLite store bootstrap: schema, legacy adaptation and seeding.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the DormHelper store.
//! - Run the startup sequence: schema -> legacy backfill -> seed.
//!
//! # Invariants
//! - Startup is idempotent and safe on stores created by any older revision.
//! - Schema evolution is additive only: columns are never dropped or renamed.
//! - Recoverable migration problems are reported as [`MigrationWarning`];
//!   everything else is a fatal [`DbError`].

use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod legacy;
mod open;
pub mod schema;
pub mod seed;

pub use legacy::{RequestsLayout, RequestsRevision};
pub use open::{initialize, open_db, open_db_in_memory, InitReport};

pub type DbResult<T> = Result<T, DbError>;

static IDENTIFIER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern must compile")
});

/// Fatal store errors surfaced to callers.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The physical schema cannot satisfy a logical write.
    IncompatibleSchema { table: &'static str, reason: String },
    /// A table or column name is not safe to interpolate into SQL.
    InvalidIdentifier(String),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::IncompatibleSchema { table, reason } => {
                write!(f, "table `{table}` has no compatible column set: {reason}")
            }
            Self::InvalidIdentifier(name) => write!(f, "invalid SQL identifier `{name}`"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::IncompatibleSchema { .. } => None,
            Self::InvalidIdentifier(_) => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Startup stage that produced a recoverable warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationStage {
    AddColumn {
        table: &'static str,
        column: &'static str,
    },
    CreateIndex(&'static str),
    Backfill(&'static str),
    Seed,
}

impl Display for MigrationStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AddColumn { table, column } => write!(f, "add column {table}.{column}"),
            Self::CreateIndex(name) => write!(f, "create index {name}"),
            Self::Backfill(step) => write!(f, "backfill {step}"),
            Self::Seed => write!(f, "seed"),
        }
    }
}

/// Recoverable problem hit during startup. Startup continues after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationWarning {
    pub stage: MigrationStage,
    pub message: String,
}

impl MigrationWarning {
    pub fn new(stage: MigrationStage, err: impl Display) -> Self {
        Self {
            stage,
            message: err.to_string(),
        }
    }
}

impl Display for MigrationWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failed: {}", self.stage, self.message)
    }
}

/// Rejects names that are unsafe to splice into DDL or `PRAGMA` statements.
pub fn checked_identifier(name: &str) -> DbResult<&str> {
    if IDENTIFIER_RE.is_match(name) {
        Ok(name)
    } else {
        Err(DbError::InvalidIdentifier(name.to_string()))
    }
}

/// Current UTC time as `YYYY-MM-DDTHH:MM:SS`, the text format every
/// timestamp column uses.
pub fn now_timestamp(conn: &Connection) -> rusqlite::Result<String> {
    conn.query_row("SELECT strftime('%Y-%m-%dT%H:%M:%S', 'now');", [], |row| {
        row.get(0)
    })
}
