//! Handbook tree node.
//!
//! # Invariants
//! - Parent links form a forest: `parent_id = None` marks a root and no node
//!   is its own ancestor.
//! - Siblings are ordered by `(sort_order, id)`.

use serde::{Deserialize, Serialize};

pub type HandbookNodeId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandbookNode {
    pub id: HandbookNodeId,
    pub parent_id: Option<HandbookNodeId>,
    pub title: String,
    pub content: String,
    pub sort_order: i64,
}
