//! First-run announcements.

use super::{now_timestamp, DbResult};
use log::info;
use rusqlite::{params, Connection, Transaction, TransactionBehavior};

/// `(title, content)` pairs inserted into an empty `news` table.
pub const SAMPLE_NEWS: &[(&str, &str)] = &[
    (
        "Welcome to DormHelper",
        "This is a sample announcement. News and important messages from the administration will appear here.",
    ),
    (
        "Dormitory cleaning schedule",
        "Dear residents! A reminder of the cleaning schedule: floors 1-2 on Monday, floors 3-4 on Tuesday.",
    ),
    (
        "Planned water outage",
        "On Wednesday from 09:00 to 12:00 the water supply will be shut off on all floors for maintenance.",
    ),
];

/// Inserts [`SAMPLE_NEWS`] when `news` has no rows and returns how many rows
/// were inserted. Count check and inserts share one transaction.
pub fn seed_if_empty(conn: &Connection) -> DbResult<usize> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    let existing: i64 = tx.query_row("SELECT COUNT(*) FROM news;", [], |row| row.get(0))?;
    if existing > 0 {
        return Ok(0);
    }

    let now = now_timestamp(&tx)?;
    for (title, content) in SAMPLE_NEWS {
        tx.execute(
            "INSERT INTO news (title, content, created_at) VALUES (?1, ?2, ?3);",
            params![title, content, now],
        )?;
    }
    tx.commit()?;

    info!(
        "event=seed_news module=db status=ok seeded={}",
        SAMPLE_NEWS.len()
    );
    Ok(SAMPLE_NEWS.len())
}
