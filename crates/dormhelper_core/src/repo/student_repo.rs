//! Student directory repository.
//!
//! # Invariants
//! - Names and rooms are trimmed before they are stored or matched.
//! - `(full_name, room)` is the lookup identity for self-registration.
//! - Deleting a student deletes its neighbor rows in the same transaction.

use super::{write_tx, RepoResult};
use crate::db::now_timestamp;
use crate::model::student::{ProfileUpsert, Student, StudentId};
use crate::model::{optional_text, required_text};
use rusqlite::{params, Connection, OptionalExtension, Row};

const STUDENT_SELECT_SQL: &str = "SELECT id, full_name, room, floor, created_at FROM students";

pub trait StudentRepository {
    fn add(&self, full_name: &str, room: Option<&str>, floor: Option<&str>)
        -> RepoResult<StudentId>;
    fn get(&self, id: StudentId) -> RepoResult<Option<Student>>;
    /// Students in `room`, ordered by full name.
    fn find_by_room(&self, room: &str) -> RepoResult<Vec<Student>>;
    /// First student matching both name and room. `None` room matches rows
    /// without a room.
    fn find_by_name_and_room(
        &self,
        full_name: &str,
        room: Option<&str>,
    ) -> RepoResult<Option<Student>>;
    /// Returns `false` when no student has `id`.
    fn update(
        &self,
        id: StudentId,
        full_name: &str,
        room: Option<&str>,
        floor: Option<&str>,
    ) -> RepoResult<bool>;
    /// Updates the `(full_name, room)` match or inserts a new student.
    fn upsert_profile(
        &self,
        full_name: &str,
        room: &str,
        floor: Option<&str>,
    ) -> RepoResult<ProfileUpsert>;
    /// Returns `false` when no student has `id`.
    fn delete(&self, id: StudentId) -> RepoResult<bool>;
}

pub struct SqliteStudentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStudentRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl StudentRepository for SqliteStudentRepository<'_> {
    fn add(
        &self,
        full_name: &str,
        room: Option<&str>,
        floor: Option<&str>,
    ) -> RepoResult<StudentId> {
        let full_name = required_text("full_name", full_name)?;
        insert_student(
            self.conn,
            &full_name,
            optional_text(room).as_deref(),
            optional_text(floor).as_deref(),
        )
    }

    fn get(&self, id: StudentId) -> RepoResult<Option<Student>> {
        let student = self
            .conn
            .query_row(
                &format!("{STUDENT_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_student_row,
            )
            .optional()?;
        Ok(student)
    }

    fn find_by_room(&self, room: &str) -> RepoResult<Vec<Student>> {
        let mut stmt = self.conn.prepare(&format!(
            "{STUDENT_SELECT_SQL} WHERE room = ?1 ORDER BY full_name ASC, id ASC;"
        ))?;
        let rows = stmt.query_map([room.trim()], parse_student_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn find_by_name_and_room(
        &self,
        full_name: &str,
        room: Option<&str>,
    ) -> RepoResult<Option<Student>> {
        find_match(
            self.conn,
            full_name.trim(),
            optional_text(room).as_deref(),
        )
    }

    fn update(
        &self,
        id: StudentId,
        full_name: &str,
        room: Option<&str>,
        floor: Option<&str>,
    ) -> RepoResult<bool> {
        let full_name = required_text("full_name", full_name)?;
        let changed = self.conn.execute(
            "UPDATE students SET full_name = ?1, room = ?2, floor = ?3 WHERE id = ?4;",
            params![full_name, optional_text(room), optional_text(floor), id],
        )?;
        Ok(changed > 0)
    }

    fn upsert_profile(
        &self,
        full_name: &str,
        room: &str,
        floor: Option<&str>,
    ) -> RepoResult<ProfileUpsert> {
        let full_name = required_text("full_name", full_name)?;
        let room = required_text("room", room)?;
        let floor = optional_text(floor);

        write_tx(self.conn, |tx| {
            match find_match(tx, &full_name, Some(room.as_str()))? {
                Some(existing) => {
                    tx.execute(
                        "UPDATE students SET full_name = ?1, room = ?2, floor = ?3 WHERE id = ?4;",
                        params![full_name, room, floor, existing.id],
                    )?;
                    Ok(ProfileUpsert::Updated(existing.id))
                }
                None => insert_student(tx, &full_name, Some(room.as_str()), floor.as_deref())
                    .map(ProfileUpsert::Inserted),
            }
        })
    }

    fn delete(&self, id: StudentId) -> RepoResult<bool> {
        write_tx(self.conn, |tx| {
            // Legacy stores may lack the cascading foreign key.
            tx.execute("DELETE FROM neighbors WHERE student_id = ?1;", [id])?;
            let changed = tx.execute("DELETE FROM students WHERE id = ?1;", [id])?;
            Ok(changed > 0)
        })
    }
}

fn insert_student(
    conn: &Connection,
    full_name: &str,
    room: Option<&str>,
    floor: Option<&str>,
) -> RepoResult<StudentId> {
    let now = now_timestamp(conn)?;
    conn.execute(
        "INSERT INTO students (full_name, room, floor, created_at) VALUES (?1, ?2, ?3, ?4);",
        params![full_name, room, floor, now],
    )?;
    Ok(conn.last_insert_rowid())
}

fn find_match(
    conn: &Connection,
    full_name: &str,
    room: Option<&str>,
) -> RepoResult<Option<Student>> {
    let student = conn
        .query_row(
            &format!(
                "{STUDENT_SELECT_SQL} WHERE full_name = ?1 AND room IS ?2 ORDER BY id ASC LIMIT 1;"
            ),
            params![full_name, room],
            parse_student_row,
        )
        .optional()?;
    Ok(student)
}

fn parse_student_row(row: &Row<'_>) -> rusqlite::Result<Student> {
    Ok(Student {
        id: row.get("id")?,
        full_name: row.get("full_name")?,
        room: row.get("room")?,
        floor: row.get("floor")?,
        created_at: row.get("created_at")?,
    })
}
