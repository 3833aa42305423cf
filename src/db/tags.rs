//! Tag CRUD and item/tag associations.

use rusqlite::{Connection, OptionalExtension};
use tracing::debug;

use super::schema::SENTINEL_TAG_NAME;
use super::Catalog;
use crate::error::{CatalogError, Result};

/// Resolve a tag name to its id.
pub(crate) fn tag_id(conn: &Connection, name: &str) -> Result<Option<i64>> {
    Ok(conn
        .query_row("SELECT Id FROM Tags WHERE Name = ?", [name], |row| row.get(0))
        .optional()?)
}

pub(crate) fn require_tag(conn: &Connection, name: &str) -> Result<i64> {
    tag_id(conn, name)?.ok_or_else(|| CatalogError::not_found("tag", name))
}

fn reject_sentinel(name: &str) -> Result<()> {
    if name == SENTINEL_TAG_NAME {
        return Err(CatalogError::Constraint(format!(
            "tag '{}' is reserved",
            SENTINEL_TAG_NAME
        )));
    }
    Ok(())
}

impl Catalog {
    /// Create a tag. Duplicate names fail with a constraint error.
    pub fn add_tag(&self, name: &str) -> Result<()> {
        self.with_connection("add_tag", |conn| {
            conn.execute("INSERT INTO Tags (Name) VALUES (?)", [name])?;
            debug!(tag = name, "tag added");
            Ok(())
        })
    }

    /// Delete a tag and every association referencing it.
    /// Removing an unknown tag is a no-op; the sentinel tag cannot be removed.
    pub fn remove_tag(&self, name: &str) -> Result<()> {
        self.with_connection("remove_tag", |conn| {
            reject_sentinel(name)?;
            let tx = conn.transaction()?;
            let Some(id) = tag_id(&tx, name)? else {
                return Ok(());
            };
            tx.execute("DELETE FROM ItemTags WHERE TagId = ?", [id])?;
            tx.execute("DELETE FROM CollectionTags WHERE TagId = ?", [id])?;
            tx.execute("DELETE FROM Tags WHERE Id = ?", [id])?;
            tx.commit()?;

            debug!(tag = name, id, "tag removed");
            Ok(())
        })
    }

    /// Attach an existing tag to a catalogued item.
    ///
    /// The tag and item are looked up first; this is not atomic with respect
    /// to a concurrent removal through another catalog instance on the same
    /// file.
    pub fn add_tag_to_item(&self, path: &str, tag: &str) -> Result<()> {
        self.with_connection("add_tag_to_item", |conn| {
            let id = require_tag(conn, tag)?;
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM MediaItems WHERE Path = ?)",
                [path],
                |row| row.get(0),
            )?;
            if !exists {
                return Err(CatalogError::not_found("item", path));
            }

            conn.execute(
                "INSERT INTO ItemTags (TagId, Item) VALUES (?, ?)",
                rusqlite::params![id, path],
            )?;
            debug!(path, tag, "tag attached");
            Ok(())
        })
    }

    /// Detach a tag from an item. A pair that is not associated is a no-op.
    pub fn remove_tag_from_item(&self, path: &str, tag: &str) -> Result<()> {
        self.with_connection("remove_tag_from_item", |conn| {
            reject_sentinel(tag)?;
            let Some(id) = tag_id(conn, tag)? else {
                return Ok(());
            };
            let removed = conn.execute(
                "DELETE FROM ItemTags WHERE TagId = ? AND Item = ?",
                rusqlite::params![id, path],
            )?;
            debug!(path, tag, removed, "tag detached");
            Ok(())
        })
    }
}
