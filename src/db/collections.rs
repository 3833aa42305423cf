//! Collections: named groups of items with their own tags.

use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::tags::require_tag;
use super::Catalog;
use crate::error::{CatalogError, Result};

/// A named collection of items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub name: String,
    pub icon: Option<String>,
    pub description: Option<String>,
    /// Unix time of the last membership or tag change
    pub last_updated: i64,
}

impl Collection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            icon: None,
            description: None,
            last_updated: chrono::Utc::now().timestamp(),
        }
    }
}

fn require_collection(conn: &Connection, name: &str) -> Result<()> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM Collections WHERE Name = ?)",
        [name],
        |row| row.get(0),
    )?;
    if exists {
        Ok(())
    } else {
        Err(CatalogError::not_found("collection", name))
    }
}

fn touch(conn: &Connection, name: &str) -> Result<()> {
    conn.execute(
        "UPDATE Collections SET LastUpdated = ? WHERE Name = ?",
        params![chrono::Utc::now().timestamp(), name],
    )?;
    Ok(())
}

impl Catalog {
    pub fn add_collection(&self, collection: &Collection) -> Result<()> {
        self.with_connection("add_collection", |conn| {
            conn.execute(
                "INSERT INTO Collections (Name, Icon, Description, LastUpdated) VALUES (?, ?, ?, ?)",
                params![
                    collection.name,
                    collection.icon,
                    collection.description,
                    collection.last_updated
                ],
            )?;
            debug!(collection = %collection.name, "collection added");
            Ok(())
        })
    }

    /// Delete a collection and its memberships. No-op if it does not exist.
    pub fn remove_collection(&self, name: &str) -> Result<()> {
        self.with_connection("remove_collection", |conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM Collections WHERE Name = ?", [name])?;
            tx.execute("DELETE FROM CollectionItems WHERE Collection = ?", [name])?;
            tx.execute("DELETE FROM CollectionTags WHERE Collection = ?", [name])?;
            tx.commit()?;
            debug!(collection = name, "collection removed");
            Ok(())
        })
    }

    pub fn add_tag_to_collection(&self, collection: &str, tag: &str) -> Result<()> {
        self.with_connection("add_tag_to_collection", |conn| {
            let tx = conn.transaction()?;
            require_collection(&tx, collection)?;
            let id = require_tag(&tx, tag)?;
            tx.execute(
                "INSERT INTO CollectionTags (TagId, Collection) VALUES (?, ?)",
                params![id, collection],
            )?;
            touch(&tx, collection)?;
            tx.commit()?;
            debug!(collection, tag, "tag attached to collection");
            Ok(())
        })
    }

    /// Detach a tag from a collection. A pair that is not associated is a no-op.
    pub fn remove_tag_from_collection(&self, collection: &str, tag: &str) -> Result<()> {
        self.with_connection("remove_tag_from_collection", |conn| {
            let tx = conn.transaction()?;
            let removed = tx.execute(
                r#"
                DELETE FROM CollectionTags
                WHERE Collection = ? AND TagId = (SELECT Id FROM Tags WHERE Name = ?)
                "#,
                params![collection, tag],
            )?;
            if removed > 0 {
                touch(&tx, collection)?;
            }
            tx.commit()?;
            Ok(())
        })
    }

    pub fn add_item_to_collection(&self, collection: &str, path: &str) -> Result<()> {
        self.with_connection("add_item_to_collection", |conn| {
            let tx = conn.transaction()?;
            require_collection(&tx, collection)?;
            let exists: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM MediaItems WHERE Path = ?)",
                [path],
                |row| row.get(0),
            )?;
            if !exists {
                return Err(CatalogError::not_found("item", path));
            }
            tx.execute(
                "INSERT INTO CollectionItems (Collection, Item) VALUES (?, ?)",
                params![collection, path],
            )?;
            touch(&tx, collection)?;
            tx.commit()?;
            debug!(collection, path, "item added to collection");
            Ok(())
        })
    }

    pub fn remove_item_from_collection(&self, collection: &str, path: &str) -> Result<()> {
        self.with_connection("remove_item_from_collection", |conn| {
            let tx = conn.transaction()?;
            let removed = tx.execute(
                "DELETE FROM CollectionItems WHERE Collection = ? AND Item = ?",
                params![collection, path],
            )?;
            if removed > 0 {
                touch(&tx, collection)?;
            }
            tx.commit()?;
            Ok(())
        })
    }

    pub fn list_collections(&self) -> Result<Vec<Collection>> {
        self.with_connection("list_collections", |conn| {
            let mut stmt = conn.prepare(
                "SELECT Name, Icon, Description, LastUpdated FROM Collections ORDER BY Name",
            )?;
            let collections = stmt
                .query_map([], |row| {
                    Ok(Collection {
                        name: row.get(0)?,
                        icon: row.get(1)?,
                        description: row.get(2)?,
                        last_updated: row.get(3)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(collections)
        })
    }

    /// Paths in a collection, in the order they were added.
    pub fn list_collection_items(&self, collection: &str) -> Result<Vec<String>> {
        self.with_connection("list_collection_items", |conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT Item FROM CollectionItems
                WHERE Collection = ?
                GROUP BY Item
                ORDER BY MIN(rowid)
                "#,
            )?;
            let items = stmt
                .query_map([collection], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            Ok(items)
        })
    }

    pub fn list_collection_tags(&self, collection: &str) -> Result<Vec<String>> {
        self.with_connection("list_collection_tags", |conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT t.Name
                FROM CollectionTags ct
                JOIN Tags t ON t.Id = ct.TagId
                WHERE ct.Collection = ?
                GROUP BY t.Id
                ORDER BY MIN(ct.rowid)
                "#,
            )?;
            let tags = stmt
                .query_map([collection], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            Ok(tags)
        })
    }
}
