//! Catalogued items and their CRUD operations.

use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::schema::SENTINEL_TAG_ID;
use super::Catalog;
use crate::error::Result;

/// Metadata of one catalogued file. `path` identifies it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    pub path: String,
    /// File type, usually the lowercase extension
    #[serde(rename = "type")]
    pub file_type: String,
    /// Size in bytes
    pub size: i64,
    /// Unix time of last modification
    pub modified: i64,
    pub name: Option<String>,
    pub description: Option<String>,
}

impl MediaItem {
    pub fn new(path: impl Into<String>, file_type: impl Into<String>, size: i64, modified: i64) -> Self {
        Self {
            path: path.into(),
            file_type: file_type.into(),
            size,
            modified,
            name: None,
            description: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Columns must be selected in the order of [`ITEM_COLUMNS`].
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            path: row.get(0)?,
            file_type: row.get(1)?,
            size: row.get(2)?,
            modified: row.get(3)?,
            name: row.get(4)?,
            description: row.get(5)?,
        })
    }
}

pub(crate) const ITEM_COLUMNS: &str = "m.Path, m.Type, m.Size, m.Modified, m.Name, m.Description";

impl Catalog {
    /// Insert an item and mark it as catalogued with the sentinel tag.
    ///
    /// Fails with a constraint error if the path is already catalogued.
    pub fn add_item(&self, item: &MediaItem) -> Result<()> {
        self.with_connection("add_item", |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                r#"
                INSERT INTO MediaItems (Path, Size, Modified, Type, Name, Description)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
                params![
                    item.path,
                    item.size,
                    item.modified,
                    item.file_type,
                    item.name,
                    item.description
                ],
            )?;
            tx.execute(
                "INSERT INTO ItemTags (TagId, Item) VALUES (?, ?)",
                params![SENTINEL_TAG_ID, item.path],
            )?;
            tx.commit()?;

            debug!(path = %item.path, "item added");
            Ok(())
        })
    }

    /// Delete an item and every association referencing it.
    /// Removing a path that is not catalogued is a no-op.
    pub fn remove_item(&self, path: &str) -> Result<()> {
        self.with_connection("remove_item", |conn| {
            let tx = conn.transaction()?;
            let removed = tx.execute("DELETE FROM MediaItems WHERE Path = ?", [path])?;
            tx.execute("DELETE FROM ItemTags WHERE Item = ?", [path])?;
            tx.execute("DELETE FROM CollectionItems WHERE Item = ?", [path])?;
            tx.commit()?;

            debug!(path, removed, "item removed");
            Ok(())
        })
    }

    /// Look up a single item by path.
    pub fn get_item(&self, path: &str) -> Result<Option<MediaItem>> {
        self.with_connection("get_item", |conn| {
            let item = conn
                .query_row(
                    &format!("SELECT {} FROM MediaItems m WHERE m.Path = ?", ITEM_COLUMNS),
                    [path],
                    MediaItem::from_row,
                )
                .optional()?;
            Ok(item)
        })
    }

    pub fn item_count(&self) -> Result<i64> {
        self.with_connection("item_count", |conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM MediaItems", [], |row| row.get(0))?)
        })
    }
}
