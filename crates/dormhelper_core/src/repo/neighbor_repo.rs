//! Neighbor contacts owned by a student.

use super::RepoResult;
use crate::model::student::{Neighbor, NeighborId, StudentId};
use crate::model::{optional_text, required_text};
use rusqlite::{params, Connection, Row};

pub trait NeighborRepository {
    /// Fails with a constraint error when `student_id` does not exist.
    fn add(&self, student_id: StudentId, name: &str, contact: Option<&str>)
        -> RepoResult<NeighborId>;
    fn list_by_student(&self, student_id: StudentId) -> RepoResult<Vec<Neighbor>>;
}

pub struct SqliteNeighborRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNeighborRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl NeighborRepository for SqliteNeighborRepository<'_> {
    fn add(
        &self,
        student_id: StudentId,
        name: &str,
        contact: Option<&str>,
    ) -> RepoResult<NeighborId> {
        let name = required_text("name", name)?;
        self.conn.execute(
            "INSERT INTO neighbors (student_id, name, contact) VALUES (?1, ?2, ?3);",
            params![student_id, name, optional_text(contact)],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn list_by_student(&self, student_id: StudentId) -> RepoResult<Vec<Neighbor>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, student_id, name, contact
             FROM neighbors
             WHERE student_id = ?1
             ORDER BY id ASC;",
        )?;
        let rows = stmt.query_map([student_id], parse_neighbor_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

fn parse_neighbor_row(row: &Row<'_>) -> rusqlite::Result<Neighbor> {
    Ok(Neighbor {
        id: row.get("id")?,
        student_id: row.get("student_id")?,
        name: row.get("name")?,
        contact: row.get("contact")?,
    })
}
