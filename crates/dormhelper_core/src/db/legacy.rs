//! Compatibility with older revisions of the `requests` table.
//!
//! # Responsibility
//! - Classify the physical `requests` layout into a [`RequestsRevision`].
//! - Migrate legacy layouts forward: add current columns, then backfill them
//!   from the renamed legacy columns.
//! - Tell the request repository which physical columns carry each logical
//!   field, for both writes and reads.
//! - Repair handbook rows orphaned by stores that ran without foreign keys.
//!
//! # Invariants
//! - Backfill only fills empty targets; re-running it changes nothing.
//! - Writes populate every present column of a logical field, so readers of
//!   any revision see the same value.
//! - Backfill problems are warnings; startup always continues.

use super::schema::table_columns;
use super::{DbError, DbResult, MigrationStage, MigrationWarning};
use log::{info, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::collections::BTreeSet;

const TABLE: &str = "requests";

/// Logical request fields that may live in more than one physical column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestField {
    RequesterName,
    RequestType,
    Description,
    Room,
    Status,
    CreatedAt,
}

impl RequestField {
    pub const ALL: [RequestField; 6] = [
        Self::RequesterName,
        Self::RequestType,
        Self::Description,
        Self::Room,
        Self::Status,
        Self::CreatedAt,
    ];

    /// Current column name.
    pub fn column(self) -> &'static str {
        match self {
            Self::RequesterName => "requester_name",
            Self::RequestType => "request_type",
            Self::Description => "description",
            Self::Room => "room",
            Self::Status => "status",
            Self::CreatedAt => "created_at",
        }
    }

    /// Name the field had before it was renamed, if any.
    pub fn legacy_column(self) -> Option<&'static str> {
        match self {
            Self::RequesterName => Some("student_name"),
            Self::RequestType => Some("type"),
            Self::CreatedAt => Some("created_date"),
            Self::Description | Self::Room | Self::Status => None,
        }
    }

    /// Expression used when neither column is present.
    fn absent_value(self) -> &'static str {
        match self {
            Self::Status => "'open'",
            _ => "NULL",
        }
    }
}

/// Historical shapes of the `requests` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RequestsRevision {
    /// `requester_name` or `request_type` is missing.
    Legacy,
    /// Current names exist next to at least one legacy alias.
    Bridged,
    /// Only current names.
    Current,
}

/// Physical `requests` layout, detected once and reused for every statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestsLayout {
    revision: RequestsRevision,
    columns: BTreeSet<String>,
}

impl RequestsLayout {
    pub fn detect(conn: &Connection) -> DbResult<Self> {
        Ok(Self::from_columns(table_columns(conn, TABLE)?))
    }

    pub fn from_columns(columns: impl IntoIterator<Item = String>) -> Self {
        let columns: BTreeSet<String> = columns.into_iter().collect();
        let has_current = [RequestField::RequesterName, RequestField::RequestType]
            .iter()
            .all(|field| columns.contains(field.column()));
        let has_alias = RequestField::ALL
            .iter()
            .filter_map(|field| field.legacy_column())
            .any(|alias| columns.contains(alias));

        let revision = match (has_current, has_alias) {
            (false, _) => RequestsRevision::Legacy,
            (true, true) => RequestsRevision::Bridged,
            (true, false) => RequestsRevision::Current,
        };
        Self { revision, columns }
    }

    pub fn revision(&self) -> RequestsRevision {
        self.revision
    }

    pub fn has(&self, column: &str) -> bool {
        self.columns.contains(column)
    }

    /// Physical columns a write of `field` must populate.
    ///
    /// A `Current` layout writes current names only; older layouts also write
    /// every legacy alias that is physically present.
    pub fn write_columns(&self, field: RequestField) -> Vec<&'static str> {
        let mut targets = Vec::with_capacity(2);
        if self.has(field.column()) {
            targets.push(field.column());
        }
        if self.revision != RequestsRevision::Current {
            if let Some(alias) = field.legacy_column().filter(|alias| self.has(alias)) {
                targets.push(alias);
            }
        }
        targets
    }

    /// `(column, field)` pairs for one insert.
    ///
    /// # Errors
    /// - `IncompatibleSchema` when no column can hold the request type.
    pub fn insert_plan(&self) -> DbResult<Vec<(&'static str, RequestField)>> {
        if self.write_columns(RequestField::RequestType).is_empty() {
            return Err(DbError::IncompatibleSchema {
                table: TABLE,
                reason: "neither `request_type` nor legacy `type` exists".to_string(),
            });
        }
        Ok(RequestField::ALL
            .iter()
            .flat_map(|&field| {
                self.write_columns(field)
                    .into_iter()
                    .map(move |column| (column, field))
            })
            .collect())
    }

    /// SQL expression producing `field` under its current name.
    pub fn read_expr(&self, field: RequestField) -> String {
        let current = field.column();
        let alias = field.legacy_column().filter(|alias| self.has(alias));
        match (self.has(current), alias) {
            (true, Some(alias)) => {
                format!("COALESCE(NULLIF({current}, ''), {alias}) AS {current}")
            }
            (true, None) => current.to_string(),
            (false, Some(alias)) => format!("{alias} AS {current}"),
            (false, None) => format!("{} AS {current}", field.absent_value()),
        }
    }

    /// Full select list for request reads, ending with `updated_at`.
    pub fn select_list(&self) -> String {
        let mut parts = vec!["id".to_string()];
        parts.extend(RequestField::ALL.iter().map(|&field| self.read_expr(field)));
        parts.push(if self.has("updated_at") {
            "updated_at".to_string()
        } else {
            "NULL AS updated_at".to_string()
        });
        parts.join(", ")
    }
}

type MigrationFn = fn(&Connection, &RequestsLayout) -> DbResult<usize>;

struct RequestsMigration {
    from: RequestsRevision,
    step: &'static str,
    apply: MigrationFn,
}

/// Forward steps keyed by the revision they start from, in application order.
const REQUESTS_MIGRATIONS: &[RequestsMigration] = &[
    RequestsMigration {
        from: RequestsRevision::Legacy,
        step: "add_current_columns",
        apply: add_current_columns,
    },
    RequestsMigration {
        from: RequestsRevision::Bridged,
        step: "copy_legacy_aliases",
        apply: copy_legacy_aliases,
    },
];

/// Outcome of one backfill pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackfillReport {
    /// Layout after all steps ran, `None` when it could not be detected.
    pub layout: Option<RequestsLayout>,
    pub warnings: Vec<MigrationWarning>,
}

/// Migrates the `requests` table forward from whatever revision it has.
pub fn backfill(conn: &Connection) -> BackfillReport {
    let mut warnings = Vec::new();
    let mut layout = match RequestsLayout::detect(conn) {
        Ok(layout) => layout,
        Err(err) => {
            warn_step(&mut warnings, "detect_layout", err);
            return BackfillReport {
                layout: None,
                warnings,
            };
        }
    };

    for migration in REQUESTS_MIGRATIONS {
        if layout.revision() != migration.from {
            continue;
        }
        match run_in_tx(conn, |tx| (migration.apply)(tx, &layout)) {
            Ok(rows) => info!(
                "event=requests_backfill module=db status=ok step={} rows={}",
                migration.step, rows
            ),
            Err(err) => warn_step(&mut warnings, migration.step, err),
        }
        match RequestsLayout::detect(conn) {
            Ok(next) => layout = next,
            Err(err) => {
                warn_step(&mut warnings, "detect_layout", err);
                return BackfillReport {
                    layout: None,
                    warnings,
                };
            }
        }
    }

    if let Err(err) = run_in_tx(conn, |tx| normalize_status(tx, &layout)) {
        warn_step(&mut warnings, "normalize_status", err);
    }

    BackfillReport {
        layout: Some(layout),
        warnings,
    }
}

/// Detaches handbook nodes whose parent row no longer exists; they become
/// roots. Returns a warning instead of failing startup.
pub fn repair_handbook_orphans(conn: &Connection) -> Option<MigrationWarning> {
    match run_in_tx(conn, detach_orphans) {
        Ok(0) => None,
        Ok(rows) => {
            info!(
                "event=handbook_backfill module=db status=ok step=handbook_orphans rows={}",
                rows
            );
            None
        }
        Err(err) => {
            warn!(
                "event=handbook_backfill module=db status=warn step=handbook_orphans error={}",
                err
            );
            Some(MigrationWarning::new(
                MigrationStage::Backfill("handbook_orphans"),
                err,
            ))
        }
    }
}

fn run_in_tx(
    conn: &Connection,
    apply: impl FnOnce(&Connection) -> DbResult<usize>,
) -> DbResult<usize> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    let rows = apply(&tx)?;
    tx.commit()?;
    Ok(rows)
}

fn warn_step(warnings: &mut Vec<MigrationWarning>, step: &'static str, err: DbError) {
    warn!(
        "event=requests_backfill module=db status=warn step={} error={}",
        step, err
    );
    warnings.push(MigrationWarning::new(MigrationStage::Backfill(step), err));
}

fn add_current_columns(conn: &Connection, layout: &RequestsLayout) -> DbResult<usize> {
    let mut added = 0;
    for field in [RequestField::RequesterName, RequestField::RequestType] {
        if layout.has(field.column()) {
            continue;
        }
        conn.execute_batch(&format!(
            "ALTER TABLE {TABLE} ADD COLUMN {} TEXT;",
            field.column()
        ))?;
        added += 1;
    }
    Ok(added)
}

fn copy_legacy_aliases(conn: &Connection, layout: &RequestsLayout) -> DbResult<usize> {
    let mut copied = 0;
    for field in RequestField::ALL {
        let Some(alias) = field.legacy_column() else {
            continue;
        };
        let target = field.column();
        if !layout.has(alias) || !layout.has(target) {
            continue;
        }
        // Only the timestamp copy skips NULL sources.
        let source_guard = match field {
            RequestField::CreatedAt => format!(" AND {alias} IS NOT NULL"),
            _ => String::new(),
        };
        copied += conn.execute(
            &format!(
                "UPDATE {TABLE}
                 SET {target} = {alias}
                 WHERE ({target} IS NULL OR {target} = ''){source_guard};"
            ),
            [],
        )?;
    }
    Ok(copied)
}

fn detach_orphans(conn: &Connection) -> DbResult<usize> {
    let rows = conn.execute(
        "UPDATE handbook
         SET parent_id = NULL
         WHERE parent_id IS NOT NULL
           AND parent_id NOT IN (SELECT id FROM handbook);",
        [],
    )?;
    Ok(rows)
}

fn normalize_status(conn: &Connection, layout: &RequestsLayout) -> DbResult<usize> {
    if !layout.has(RequestField::Status.column()) {
        return Ok(0);
    }
    let rows = conn.execute(
        "UPDATE requests
         SET status = 'open'
         WHERE status IS NULL OR TRIM(status) = '';",
        [],
    )?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(columns: &[&str]) -> RequestsLayout {
        RequestsLayout::from_columns(columns.iter().map(|c| c.to_string()))
    }

    #[test]
    fn detects_revisions_from_column_sets() {
        assert_eq!(
            layout(&["id", "type", "student_name", "description"]).revision(),
            RequestsRevision::Legacy
        );
        assert_eq!(
            layout(&["id", "type", "requester_name", "request_type"]).revision(),
            RequestsRevision::Bridged
        );
        assert_eq!(
            layout(&["id", "requester_name", "request_type", "status"]).revision(),
            RequestsRevision::Current
        );
    }

    #[test]
    fn bridged_layout_writes_both_names() {
        let bridged = layout(&[
            "id",
            "type",
            "request_type",
            "requester_name",
            "created_at",
            "created_date",
        ]);
        assert_eq!(
            bridged.write_columns(RequestField::RequestType),
            vec!["request_type", "type"]
        );
        assert_eq!(
            bridged.write_columns(RequestField::CreatedAt),
            vec!["created_at", "created_date"]
        );
        assert!(bridged.write_columns(RequestField::Room).is_empty());
    }

    #[test]
    fn insert_plan_requires_a_request_type_column() {
        let broken = layout(&["id", "note"]);
        assert!(matches!(
            broken.insert_plan(),
            Err(DbError::IncompatibleSchema { table: "requests", .. })
        ));

        let legacy_only = layout(&["id", "type"]);
        let plan = legacy_only.insert_plan().unwrap();
        assert_eq!(plan, vec![("type", RequestField::RequestType)]);
    }

    #[test]
    fn read_expr_falls_back_to_aliases_and_defaults() {
        let legacy = layout(&["id", "type"]);
        assert_eq!(
            legacy.read_expr(RequestField::RequestType),
            "type AS request_type"
        );
        assert_eq!(legacy.read_expr(RequestField::Status), "'open' AS status");
        assert_eq!(legacy.read_expr(RequestField::Room), "NULL AS room");

        let bridged = layout(&["id", "type", "request_type", "requester_name"]);
        assert_eq!(
            bridged.read_expr(RequestField::RequestType),
            "COALESCE(NULLIF(request_type, ''), type) AS request_type"
        );
    }

    #[test]
    fn alias_copy_skips_null_sources_only_for_timestamps() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE requests (
                id INTEGER PRIMARY KEY,
                type TEXT,
                request_type TEXT,
                requester_name TEXT,
                student_name TEXT,
                created_date TEXT,
                created_at TEXT
            );
            INSERT INTO requests VALUES (1, '', NULL, '', 'Ann Lee', NULL, '');",
        )
        .unwrap();

        let report = backfill(&conn);
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);

        let row: (Option<String>, Option<String>, Option<String>) = conn
            .query_row(
                "SELECT request_type, requester_name, created_at FROM requests;",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();
        assert_eq!(
            row,
            (
                Some(String::new()),
                Some("Ann Lee".to_string()),
                Some(String::new())
            )
        );
    }
}
