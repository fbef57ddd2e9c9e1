//! Table definitions and additive column evolution.
//!
//! # Responsibility
//! - Create every entity table on first start.
//! - Bring tables created by older revisions up to the expected column set.
//! - Create the secondary indexes used by status and room lookups.
//!
//! # Invariants
//! - Every statement is idempotent; `ensure_schema` runs on each start.
//! - Columns are only ever added, never dropped or renamed.
//! - A failed column add or index build is a warning, not an abort.

use super::{checked_identifier, DbResult, MigrationStage, MigrationWarning};
use log::{info, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// Entity tables in dependency order (`neighbors` references `students`).
pub const TABLES: &[&str] = &["news", "requests", "handbook", "students", "neighbors"];

const CREATE_TABLES_SQL: &str = "
CREATE TABLE IF NOT EXISTS news (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS requests (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    requester_name TEXT,
    request_type TEXT NOT NULL,
    description TEXT,
    room TEXT,
    status TEXT NOT NULL DEFAULT 'open',
    created_at TEXT NOT NULL,
    updated_at TEXT
);

CREATE TABLE IF NOT EXISTS handbook (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    parent_id INTEGER REFERENCES handbook(id) ON DELETE SET NULL,
    title TEXT NOT NULL,
    content TEXT,
    sort_order INTEGER DEFAULT 0
);

CREATE TABLE IF NOT EXISTS students (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    full_name TEXT NOT NULL,
    room TEXT,
    floor TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS neighbors (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    student_id INTEGER REFERENCES students(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    contact TEXT
);
";

/// One column every store must eventually carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpectedColumn {
    pub table: &'static str,
    pub column: &'static str,
    /// Full `ADD COLUMN` definition, including the column name.
    pub definition: &'static str,
}

const fn expected(
    table: &'static str,
    column: &'static str,
    definition: &'static str,
) -> ExpectedColumn {
    ExpectedColumn {
        table,
        column,
        definition,
    }
}

/// Columns that older revisions may lack.
///
/// `requests.requester_name` and `requests.request_type` are owned by the
/// legacy adapter because they replace renamed columns.
pub const EXPECTED_COLUMNS: &[ExpectedColumn] = &[
    expected("news", "created_at", "created_at TEXT"),
    expected("requests", "description", "description TEXT"),
    expected("requests", "room", "room TEXT"),
    expected("requests", "status", "status TEXT DEFAULT 'open'"),
    expected("requests", "created_at", "created_at TEXT"),
    expected("requests", "updated_at", "updated_at TEXT"),
    expected("handbook", "parent_id", "parent_id INTEGER"),
    expected("handbook", "content", "content TEXT"),
    expected("handbook", "sort_order", "sort_order INTEGER DEFAULT 0"),
    expected("students", "room", "room TEXT"),
    expected("students", "floor", "floor TEXT"),
    expected("students", "created_at", "created_at TEXT"),
    expected("neighbors", "contact", "contact TEXT"),
];

/// Secondary indexes as `(name, table, column)`.
pub const INDEXES: &[(&str, &str, &str)] = &[
    ("idx_requests_status", "requests", "status"),
    ("idx_students_room", "students", "room"),
];

/// Creates missing tables, adds missing columns and builds indexes.
///
/// Table creation errors are fatal. Column and index errors are returned as
/// warnings so startup can proceed with a best-effort schema.
pub fn ensure_schema(conn: &Connection) -> DbResult<Vec<MigrationWarning>> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    tx.execute_batch(CREATE_TABLES_SQL)?;
    tx.commit()?;

    let mut warnings = ensure_expected_columns(conn, EXPECTED_COLUMNS);
    warnings.extend(ensure_indexes(conn));
    Ok(warnings)
}

/// Walks the checklist and adds each absent column in place.
///
/// Every entry is attempted even when an earlier one fails.
pub fn ensure_expected_columns(
    conn: &Connection,
    checklist: &[ExpectedColumn],
) -> Vec<MigrationWarning> {
    let mut warnings = Vec::new();
    for item in checklist {
        match ensure_column(conn, item) {
            Ok(true) => info!(
                "event=schema_add_column module=db status=ok table={} column={}",
                item.table, item.column
            ),
            Ok(false) => {}
            Err(err) => {
                warn!(
                    "event=schema_add_column module=db status=warn table={} column={} error={}",
                    item.table, item.column, err
                );
                warnings.push(MigrationWarning::new(
                    MigrationStage::AddColumn {
                        table: item.table,
                        column: item.column,
                    },
                    err,
                ));
            }
        }
    }
    warnings
}

/// Returns `true` when the column had to be added.
fn ensure_column(conn: &Connection, item: &ExpectedColumn) -> DbResult<bool> {
    if table_has_column(conn, item.table, item.column)? {
        return Ok(false);
    }
    let table = checked_identifier(item.table)?;
    conn.execute_batch(&format!(
        "ALTER TABLE {table} ADD COLUMN {};",
        item.definition
    ))?;
    Ok(true)
}

fn ensure_indexes(conn: &Connection) -> Vec<MigrationWarning> {
    let mut warnings = Vec::new();
    for &(name, table, column) in INDEXES {
        let result = checked_identifier(table)
            .and_then(|_| checked_identifier(column))
            .and_then(|_| {
                conn.execute_batch(&format!(
                    "CREATE INDEX IF NOT EXISTS {name} ON {table}({column});"
                ))
                .map_err(Into::into)
            });
        if let Err(err) = result {
            warn!(
                "event=schema_index module=db status=warn index={} error={}",
                name, err
            );
            warnings.push(MigrationWarning::new(
                MigrationStage::CreateIndex(name),
                err,
            ));
        }
    }
    warnings
}

/// Physical column names of `table`, in declaration order.
///
/// An absent table yields an empty list.
pub fn table_columns(conn: &Connection, table: &str) -> DbResult<Vec<String>> {
    let table = checked_identifier(table)?;
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        columns.push(row.get(1)?);
    }
    Ok(columns)
}

pub fn table_has_column(conn: &Connection, table: &str, column: &str) -> DbResult<bool> {
    Ok(table_columns(conn, table)?
        .iter()
        .any(|current| current == column))
}

pub fn table_exists(conn: &Connection, table: &str) -> DbResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_schema_creates_all_tables_and_indexes() {
        let conn = Connection::open_in_memory().unwrap();
        let warnings = ensure_schema(&conn).unwrap();
        assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");

        for table in TABLES {
            assert!(table_exists(&conn, table).unwrap(), "missing table {table}");
        }
        for &(name, _, _) in INDEXES {
            let exists: i64 = conn
                .query_row(
                    "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'index' AND name = ?1);",
                    [name],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(exists, 1, "missing index {name}");
        }
    }

    #[test]
    fn failed_column_add_does_not_stop_the_checklist() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE news (id INTEGER PRIMARY KEY, title TEXT);")
            .unwrap();

        let checklist = [
            expected("news", "broken", "broken TEXT NOT NULL"),
            expected("news", "created_at", "created_at TEXT"),
        ];
        let warnings = ensure_expected_columns(&conn, &checklist);

        assert_eq!(warnings.len(), 1);
        assert_eq!(
            warnings[0].stage,
            MigrationStage::AddColumn {
                table: "news",
                column: "broken",
            }
        );
        assert!(table_has_column(&conn, "news", "created_at").unwrap());
        assert!(!table_has_column(&conn, "news", "broken").unwrap());
    }

    #[test]
    fn missing_table_has_no_columns() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(table_columns(&conn, "nowhere").unwrap().is_empty());
        assert!(table_columns(&conn, "bad name").is_err());
    }
}
