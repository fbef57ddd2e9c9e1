//! Resident directory: students and their neighbor contacts.
//!
//! # Invariants
//! - `(full_name, room)` identifies a student for self-registration; the store
//!   does not enforce uniqueness.
//! - Neighbors are owned by one student and disappear with it.

use serde::{Deserialize, Serialize};

pub type StudentId = i64;
pub type NeighborId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub full_name: String,
    pub room: Option<String>,
    pub floor: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Neighbor {
    pub id: NeighborId,
    pub student_id: StudentId,
    pub name: String,
    pub contact: Option<String>,
}

/// Result of a self-registration upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileUpsert {
    /// An existing `(full_name, room)` match was updated.
    Updated(StudentId),
    /// No match existed; a new row was inserted.
    Inserted(StudentId),
}

impl ProfileUpsert {
    pub fn id(self) -> StudentId {
        match self {
            Self::Updated(id) | Self::Inserted(id) => id,
        }
    }
}
