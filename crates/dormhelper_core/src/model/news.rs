//! Announcement record.

use serde::{Deserialize, Serialize};

pub type NewsId = i64;

/// One announcement shown on the news feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct News {
    pub id: NewsId,
    pub title: String,
    /// May contain rich text or HTML; stored verbatim.
    pub content: String,
    /// `None` only for rows written before the column existed.
    pub created_at: Option<String>,
}
