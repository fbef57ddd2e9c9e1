//! Connection bootstrap and the startup sequence.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure connection pragmas required by repository behavior.
//! - Run schema -> legacy backfill -> seed before handing out a connection.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.
//! - Returned connections have been through [`initialize`].

use super::legacy::{backfill, repair_handbook_orphans, RequestsRevision};
use super::schema::ensure_schema;
use super::seed::seed_if_empty;
use super::{DbResult, MigrationStage, MigrationWarning};
use log::{error, info, warn};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// What one startup pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitReport {
    /// Recoverable problems, in the order they happened.
    pub warnings: Vec<MigrationWarning>,
    /// Sample news rows inserted by this pass.
    pub seeded: usize,
    /// Layout of `requests` after backfill, if it could be detected.
    pub requests_revision: Option<RequestsRevision>,
}

/// Opens a store file and runs [`initialize`] on it.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<(Connection, InitReport)> {
    open_with("file", || Connection::open(path))
}

/// Opens a private in-memory store and runs [`initialize`] on it.
pub fn open_db_in_memory() -> DbResult<(Connection, InitReport)> {
    open_with("memory", Connection::open_in_memory)
}

fn open_with(
    mode: &'static str,
    open: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<(Connection, InitReport)> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let result = open()
        .map_err(Into::into)
        .and_then(|conn| configure(&conn).map(|()| conn))
        .and_then(|conn| initialize(&conn).map(|report| (conn, report)));

    match &result {
        Ok(_) => info!(
            "event=db_open module=db status=ok mode={} duration_ms={}",
            mode,
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=db_open module=db status=error mode={} duration_ms={} error={}",
            mode,
            started_at.elapsed().as_millis(),
            err
        ),
    }
    result
}

fn configure(conn: &Connection) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    Ok(())
}

/// Brings the store to the current schema and seeds first-run content.
///
/// Safe to call on every start and any number of times. Only table creation
/// failures are returned as errors; column adds, backfill and seeding report
/// problems through [`InitReport::warnings`].
pub fn initialize(conn: &Connection) -> DbResult<InitReport> {
    let started_at = Instant::now();
    let mut report = InitReport {
        warnings: ensure_schema(conn)?,
        ..InitReport::default()
    };

    let backfilled = backfill(conn);
    report.requests_revision = backfilled.layout.map(|layout| layout.revision());
    report.warnings.extend(backfilled.warnings);
    report.warnings.extend(repair_handbook_orphans(conn));

    match seed_if_empty(conn) {
        Ok(seeded) => report.seeded = seeded,
        Err(err) => {
            warn!("event=seed_news module=db status=warn error={}", err);
            report
                .warnings
                .push(MigrationWarning::new(MigrationStage::Seed, err));
        }
    }

    info!(
        "event=store_init module=db status=ok duration_ms={} warnings={} seeded={} requests_revision={:?}",
        started_at.elapsed().as_millis(),
        report.warnings.len(),
        report.seeded,
        report.requests_revision
    );
    Ok(report)
}
