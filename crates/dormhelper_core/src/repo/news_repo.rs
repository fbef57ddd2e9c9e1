//! Announcement repository.
//!
//! # Invariants
//! - News rows are never updated after insert.
//! - Listing is newest first: `created_at DESC, id DESC`.

use super::RepoResult;
use crate::db::now_timestamp;
use crate::model::news::{News, NewsId};
use crate::model::{positive_limit, required_text};
use rusqlite::{params, Connection, OptionalExtension, Row};

const NEWS_SELECT_SQL: &str = "SELECT id, title, content, created_at FROM news";

pub trait NewsRepository {
    fn add(&self, title: &str, content: &str) -> RepoResult<NewsId>;
    fn list(&self, limit: u32) -> RepoResult<Vec<News>>;
    fn get(&self, id: NewsId) -> RepoResult<Option<News>>;
}

pub struct SqliteNewsRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNewsRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl NewsRepository for SqliteNewsRepository<'_> {
    /// Stores `content` verbatim; only the title is trimmed.
    fn add(&self, title: &str, content: &str) -> RepoResult<NewsId> {
        let title = required_text("title", title)?;
        let now = now_timestamp(self.conn)?;
        self.conn.execute(
            "INSERT INTO news (title, content, created_at) VALUES (?1, ?2, ?3);",
            params![title, content, now],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn list(&self, limit: u32) -> RepoResult<Vec<News>> {
        let limit = positive_limit(limit)?;
        let mut stmt = self.conn.prepare(&format!(
            "{NEWS_SELECT_SQL} ORDER BY created_at DESC, id DESC LIMIT ?1;"
        ))?;
        let rows = stmt.query_map([limit], parse_news_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn get(&self, id: NewsId) -> RepoResult<Option<News>> {
        let news = self
            .conn
            .query_row(
                &format!("{NEWS_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_news_row,
            )
            .optional()?;
        Ok(news)
    }
}

fn parse_news_row(row: &Row<'_>) -> rusqlite::Result<News> {
    Ok(News {
        id: row.get("id")?,
        title: row.get("title")?,
        content: row.get::<_, Option<String>>("content")?.unwrap_or_default(),
        created_at: row.get("created_at")?,
    })
}
