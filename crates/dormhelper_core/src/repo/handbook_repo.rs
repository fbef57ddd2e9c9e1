//! Handbook tree repository.
//!
//! # Responsibility
//! - Author and browse the handbook forest.
//! - Keep the forest intact when nodes are deleted.
//!
//! # Invariants
//! - Child listing is deterministic: `sort_order ASC, id ASC`.
//! - New nodes can only attach to an existing parent, so no cycle can form.
//! - Deleting a node lifts its children to the deleted node's parent and
//!   appends them after that parent's existing children. A parent that no
//!   longer exists counts as the root level.

use super::{write_tx, RepoError, RepoResult};
use crate::model::handbook::{HandbookNode, HandbookNodeId};
use crate::model::required_text;
use rusqlite::{params, Connection, OptionalExtension, Row};

const HANDBOOK_SELECT_SQL: &str = "SELECT
    id,
    parent_id,
    title,
    content,
    COALESCE(sort_order, 0) AS sort_order
FROM handbook";

pub trait HandbookRepository {
    fn add(
        &self,
        title: &str,
        content: &str,
        parent_id: Option<HandbookNodeId>,
        sort_order: i64,
    ) -> RepoResult<HandbookNodeId>;
    fn get(&self, id: HandbookNodeId) -> RepoResult<Option<HandbookNode>>;
    /// Lists children of `parent_id`; `None` lists roots.
    fn children(&self, parent_id: Option<HandbookNodeId>) -> RepoResult<Vec<HandbookNode>>;
    /// Deletes every node titled `title` and returns how many were removed.
    fn delete_by_title(&self, title: &str) -> RepoResult<usize>;
}

pub struct SqliteHandbookRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteHandbookRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl HandbookRepository for SqliteHandbookRepository<'_> {
    fn add(
        &self,
        title: &str,
        content: &str,
        parent_id: Option<HandbookNodeId>,
        sort_order: i64,
    ) -> RepoResult<HandbookNodeId> {
        let title = required_text("title", title)?;
        write_tx(self.conn, |tx| {
            if let Some(parent_id) = parent_id {
                if !node_exists(tx, parent_id)? {
                    return Err(RepoError::ParentNotFound(parent_id));
                }
            }
            tx.execute(
                "INSERT INTO handbook (parent_id, title, content, sort_order)
                 VALUES (?1, ?2, ?3, ?4);",
                params![parent_id, title, content, sort_order],
            )?;
            Ok(tx.last_insert_rowid())
        })
    }

    fn get(&self, id: HandbookNodeId) -> RepoResult<Option<HandbookNode>> {
        let node = self
            .conn
            .query_row(
                &format!("{HANDBOOK_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_handbook_row,
            )
            .optional()?;
        Ok(node)
    }

    fn children(&self, parent_id: Option<HandbookNodeId>) -> RepoResult<Vec<HandbookNode>> {
        let mut items = Vec::new();
        match parent_id {
            Some(parent_id) => {
                let mut stmt = self.conn.prepare(&format!(
                    "{HANDBOOK_SELECT_SQL}
                     WHERE parent_id = ?1
                     ORDER BY COALESCE(sort_order, 0) ASC, id ASC;"
                ))?;
                let mut rows = stmt.query([parent_id])?;
                while let Some(row) = rows.next()? {
                    items.push(parse_handbook_row(row)?);
                }
            }
            None => {
                let mut stmt = self.conn.prepare(&format!(
                    "{HANDBOOK_SELECT_SQL}
                     WHERE parent_id IS NULL
                     ORDER BY COALESCE(sort_order, 0) ASC, id ASC;"
                ))?;
                let mut rows = stmt.query([])?;
                while let Some(row) = rows.next()? {
                    items.push(parse_handbook_row(row)?);
                }
            }
        }
        Ok(items)
    }

    fn delete_by_title(&self, title: &str) -> RepoResult<usize> {
        let title = title.trim();
        write_tx(self.conn, |tx| {
            let targets = {
                let mut stmt = tx.prepare("SELECT id FROM handbook WHERE title = ?1 ORDER BY id;")?;
                let ids = stmt.query_map([title], |row| row.get::<_, HandbookNodeId>(0))?;
                ids.collect::<Result<Vec<_>, _>>()?
            };

            let mut deleted = 0;
            for node_id in targets {
                // Re-read: an earlier deletion may have moved this node.
                let parent_id: Option<HandbookNodeId> = tx.query_row(
                    "SELECT parent_id FROM handbook WHERE id = ?1;",
                    [node_id],
                    |row| row.get(0),
                )?;
                // A dangling parent link lifts the children to the roots.
                let parent_id = match parent_id {
                    Some(parent_id) if node_exists(tx, parent_id)? => Some(parent_id),
                    _ => None,
                };
                lift_children(tx, node_id, parent_id)?;
                deleted += tx.execute("DELETE FROM handbook WHERE id = ?1;", [node_id])?;
            }
            Ok(deleted)
        })
    }
}

fn lift_children(
    conn: &Connection,
    node_id: HandbookNodeId,
    new_parent: Option<HandbookNodeId>,
) -> RepoResult<()> {
    let children = {
        let mut stmt = conn.prepare(
            "SELECT id
             FROM handbook
             WHERE parent_id = ?1
             ORDER BY COALESCE(sort_order, 0) ASC, id ASC;",
        )?;
        let ids = stmt.query_map([node_id], |row| row.get::<_, HandbookNodeId>(0))?;
        ids.collect::<Result<Vec<_>, _>>()?
    };
    if children.is_empty() {
        return Ok(());
    }

    let base_order = next_sort_order(conn, new_parent)?;
    for (index, child_id) in children.into_iter().enumerate() {
        conn.execute(
            "UPDATE handbook SET parent_id = ?2, sort_order = ?3 WHERE id = ?1;",
            params![child_id, new_parent, base_order + index as i64],
        )?;
    }
    Ok(())
}

fn next_sort_order(conn: &Connection, parent_id: Option<HandbookNodeId>) -> RepoResult<i64> {
    let next = match parent_id {
        Some(parent_id) => conn.query_row(
            "SELECT COALESCE(MAX(COALESCE(sort_order, 0)), -1) + 1
             FROM handbook
             WHERE parent_id = ?1;",
            [parent_id],
            |row| row.get(0),
        )?,
        None => conn.query_row(
            "SELECT COALESCE(MAX(COALESCE(sort_order, 0)), -1) + 1
             FROM handbook
             WHERE parent_id IS NULL;",
            [],
            |row| row.get(0),
        )?,
    };
    Ok(next)
}

fn node_exists(conn: &Connection, id: HandbookNodeId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM handbook WHERE id = ?1);",
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn parse_handbook_row(row: &Row<'_>) -> rusqlite::Result<HandbookNode> {
    Ok(HandbookNode {
        id: row.get("id")?,
        parent_id: row.get("parent_id")?,
        title: row.get("title")?,
        content: row.get::<_, Option<String>>("content")?.unwrap_or_default(),
        sort_order: row.get("sort_order")?,
    })
}
