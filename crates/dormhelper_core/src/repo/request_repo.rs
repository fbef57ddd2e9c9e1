//! Maintenance request repository.
//!
//! # Responsibility
//! - Insert, list, update status and clear maintenance requests.
//! - Route every statement through the detected [`RequestsLayout`], so stores
//!   frozen at an older revision stay readable and writable.
//!
//! # Invariants
//! - The layout is detected once per repository, never per statement.
//! - Inserts populate both current and legacy column names when both exist.
//! - Listing is newest first: `created_at DESC, id DESC`.

use super::{write_tx, RepoError, RepoResult};
use crate::db::legacy::{RequestField, RequestsLayout};
use crate::db::{now_timestamp, DbError};
use crate::model::request::{MaintenanceRequest, NewRequest, RequestId, RequestStatus};
use crate::model::{optional_text, positive_limit, required_text};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

pub trait RequestRepository {
    /// Stores a new request with status `open` and returns its id.
    fn add(&self, request: &NewRequest) -> RepoResult<RequestId>;
    fn list(&self, limit: u32) -> RepoResult<Vec<MaintenanceRequest>>;
    fn list_by_room(&self, room: &str) -> RepoResult<Vec<MaintenanceRequest>>;
    /// Returns `false` when no request has `id`.
    fn update_status(&self, id: RequestId, status: &str) -> RepoResult<bool>;
    /// Deletes every request and returns how many were removed.
    fn clear_all(&self) -> RepoResult<usize>;
}

pub struct SqliteRequestRepository<'conn> {
    conn: &'conn Connection,
    layout: RequestsLayout,
}

impl<'conn> SqliteRequestRepository<'conn> {
    /// Detects the `requests` layout from the live schema.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let layout = RequestsLayout::detect(conn)?;
        Ok(Self::with_layout(conn, layout))
    }

    /// Uses a layout detected earlier on the same connection.
    pub fn with_layout(conn: &'conn Connection, layout: RequestsLayout) -> Self {
        Self { conn, layout }
    }

    pub fn layout(&self) -> &RequestsLayout {
        &self.layout
    }

    fn query_requests(
        &self,
        filter: &str,
        mut bind: Vec<Value>,
        limit: Option<u32>,
    ) -> RepoResult<Vec<MaintenanceRequest>> {
        let mut sql = format!(
            "SELECT {} FROM requests {filter} ORDER BY created_at DESC, id DESC",
            self.layout.select_list()
        );
        if let Some(limit) = limit {
            bind.push(Value::Integer(i64::from(limit)));
            sql.push_str(&format!(" LIMIT ?{}", bind.len()));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_request_row(row)?);
        }
        Ok(items)
    }
}

impl RequestRepository for SqliteRequestRepository<'_> {
    fn add(&self, request: &NewRequest) -> RepoResult<RequestId> {
        let request_type = required_text("request_type", &request.request_type)?;
        let requester_name = optional_text(request.requester_name.as_deref());
        let room = optional_text(request.room.as_deref());
        let plan = self.layout.insert_plan()?;

        write_tx(self.conn, |tx| {
            let now = now_timestamp(tx)?;
            let columns = plan
                .iter()
                .map(|(column, _)| *column)
                .collect::<Vec<_>>()
                .join(", ");
            let placeholders = (1..=plan.len())
                .map(|index| format!("?{index}"))
                .collect::<Vec<_>>()
                .join(", ");
            let values = plan.iter().map(|(_, field)| match field {
                RequestField::RequesterName => optional_value(requester_name.as_deref()),
                RequestField::RequestType => Value::Text(request_type.clone()),
                RequestField::Description => Value::Text(request.description.clone()),
                RequestField::Room => optional_value(room.as_deref()),
                RequestField::Status => Value::Text(RequestStatus::Open.as_str().to_string()),
                RequestField::CreatedAt => Value::Text(now.clone()),
            });

            tx.execute(
                &format!("INSERT INTO requests ({columns}) VALUES ({placeholders});"),
                params_from_iter(values),
            )?;
            Ok(tx.last_insert_rowid())
        })
    }

    fn list(&self, limit: u32) -> RepoResult<Vec<MaintenanceRequest>> {
        let limit = positive_limit(limit)?;
        self.query_requests("", Vec::new(), Some(limit))
    }

    fn list_by_room(&self, room: &str) -> RepoResult<Vec<MaintenanceRequest>> {
        if !self.layout.has(RequestField::Room.column()) {
            return Ok(Vec::new());
        }
        self.query_requests(
            "WHERE room = ?1",
            vec![Value::Text(room.trim().to_string())],
            None,
        )
    }

    fn update_status(&self, id: RequestId, status: &str) -> RepoResult<bool> {
        let status = RequestStatus::parse(status)?;
        for column in ["status", "updated_at"] {
            if !self.layout.has(column) {
                return Err(DbError::IncompatibleSchema {
                    table: "requests",
                    reason: format!("missing `{column}` column for status updates"),
                }
                .into());
            }
        }

        let now = now_timestamp(self.conn)?;
        let changed = self.conn.execute(
            "UPDATE requests SET status = ?1, updated_at = ?2 WHERE id = ?3;",
            params![status.as_str(), now, id],
        )?;
        Ok(changed > 0)
    }

    fn clear_all(&self) -> RepoResult<usize> {
        write_tx(self.conn, |tx| {
            let existing: i64 = tx.query_row("SELECT COUNT(*) FROM requests;", [], |row| {
                row.get(0)
            })?;
            tx.execute("DELETE FROM requests;", [])?;
            usize::try_from(existing)
                .map_err(|_| RepoError::InvalidData(format!("negative request count {existing}")))
        })
    }
}

fn optional_value(value: Option<&str>) -> Value {
    match value {
        Some(text) => Value::Text(text.to_string()),
        None => Value::Null,
    }
}

fn parse_request_row(row: &Row<'_>) -> RepoResult<MaintenanceRequest> {
    let id: RequestId = row.get("id")?;
    let status = match row.get::<_, Option<String>>("status")? {
        Some(value) => RequestStatus::parse(&value).map_err(|_| {
            RepoError::InvalidData(format!("blank status in requests.status for id {id}"))
        })?,
        None => {
            return Err(RepoError::InvalidData(format!(
                "null status in requests.status for id {id}"
            )));
        }
    };

    Ok(MaintenanceRequest {
        id,
        requester_name: row.get("requester_name")?,
        request_type: row
            .get::<_, Option<String>>("request_type")?
            .unwrap_or_default(),
        description: row.get("description")?,
        room: row.get("room")?,
        status,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
