//! Store facade handed to the presentation layer.
//!
//! # Responsibility
//! - Own the single connection for a configured store location.
//! - Run the startup sequence on open and on demand.
//! - Hand out repositories that borrow the connection.
//!
//! # Invariants
//! - The `requests` layout is detected after every [`Store::initialize`] and
//!   reused by every request repository until the next one.

use crate::config::{StoreConfig, StoreLocation};
use crate::db::schema::TABLES;
use crate::db::{
    checked_identifier, initialize, open_db, open_db_in_memory, DbResult, InitReport,
    RequestsLayout,
};
use crate::repo::handbook_repo::SqliteHandbookRepository;
use crate::repo::neighbor_repo::SqliteNeighborRepository;
use crate::repo::news_repo::SqliteNewsRepository;
use crate::repo::request_repo::SqliteRequestRepository;
use crate::repo::student_repo::SqliteStudentRepository;
use rusqlite::Connection;

/// Row count of one entity table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableCount {
    pub table: &'static str,
    pub rows: i64,
}

pub struct Store {
    conn: Connection,
    config: StoreConfig,
    requests_layout: RequestsLayout,
}

impl Store {
    /// Opens the configured store and initializes it.
    pub fn open(config: &StoreConfig) -> DbResult<(Self, InitReport)> {
        let (conn, report) = match &config.location {
            StoreLocation::File(path) => open_db(path)?,
            StoreLocation::Memory => open_db_in_memory()?,
        };
        let requests_layout = RequestsLayout::detect(&conn)?;
        let store = Self {
            conn,
            config: config.clone(),
            requests_layout,
        };
        Ok((store, report))
    }

    /// Shorthand for an isolated in-memory store.
    pub fn open_in_memory() -> DbResult<(Self, InitReport)> {
        Self::open(&StoreConfig::in_memory())
    }

    /// Re-runs schema, backfill and seeding. Idempotent.
    pub fn initialize(&mut self) -> DbResult<InitReport> {
        let report = initialize(&self.conn)?;
        self.requests_layout = RequestsLayout::detect(&self.conn)?;
        Ok(report)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Raw connection, for diagnostics and tests.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn requests_layout(&self) -> &RequestsLayout {
        &self.requests_layout
    }

    pub fn news(&self) -> SqliteNewsRepository<'_> {
        SqliteNewsRepository::new(&self.conn)
    }

    pub fn requests(&self) -> SqliteRequestRepository<'_> {
        SqliteRequestRepository::with_layout(&self.conn, self.requests_layout.clone())
    }

    pub fn handbook(&self) -> SqliteHandbookRepository<'_> {
        SqliteHandbookRepository::new(&self.conn)
    }

    pub fn students(&self) -> SqliteStudentRepository<'_> {
        SqliteStudentRepository::new(&self.conn)
    }

    pub fn neighbors(&self) -> SqliteNeighborRepository<'_> {
        SqliteNeighborRepository::new(&self.conn)
    }

    /// Row counts for every entity table, in schema order.
    pub fn table_counts(&self) -> DbResult<Vec<TableCount>> {
        TABLES
            .iter()
            .map(|&table| {
                let table = checked_identifier(table)?;
                let rows: i64 =
                    self.conn
                        .query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
                            row.get(0)
                        })?;
                Ok(TableCount { table, rows })
            })
            .collect()
    }
}
