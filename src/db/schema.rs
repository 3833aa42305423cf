/// Id of the tag every catalogued item carries.
pub const SENTINEL_TAG_ID: i64 = 1;

/// Name of the sentinel tag. Never returned by tag listings.
pub const SENTINEL_TAG_NAME: &str = "media";

/// Table and column names match catalog files written by earlier releases,
/// so a seeded working file from an existing archive opens unchanged.
pub const SCHEMA: &str = r#"
-- Catalogued files
CREATE TABLE MediaItems (
    Path        TEXT NOT NULL,
    Size        INTEGER NOT NULL,
    Modified    INTEGER NOT NULL,
    Type        TEXT NOT NULL,
    Name        TEXT,
    Description TEXT,
    PRIMARY KEY (Path)
);

-- Named groups of items
CREATE TABLE Collections (
    Name        TEXT NOT NULL,
    Icon        TEXT,
    Description TEXT,
    LastUpdated INTEGER NOT NULL,
    PRIMARY KEY (Name)
);

-- User tags; id 1 is the sentinel
CREATE TABLE Tags (
    Id   INTEGER,
    Name TEXT NOT NULL UNIQUE,
    PRIMARY KEY (Id AUTOINCREMENT)
);

-- Tag to item mapping
CREATE TABLE ItemTags (
    TagId INTEGER NOT NULL,
    Item  TEXT NOT NULL
);

CREATE INDEX idx_item_tags_item ON ItemTags(Item);
CREATE INDEX idx_item_tags_tag ON ItemTags(TagId);

-- Collection to item mapping
CREATE TABLE CollectionItems (
    Collection TEXT NOT NULL,
    Item       TEXT NOT NULL
);

CREATE INDEX idx_collection_items_collection ON CollectionItems(Collection);

-- Tag to collection mapping
CREATE TABLE CollectionTags (
    TagId      INTEGER NOT NULL,
    Collection TEXT NOT NULL
);

CREATE INDEX idx_collection_tags_collection ON CollectionTags(Collection);

INSERT INTO Tags (Id, Name) VALUES (1, 'media');
"#;

/// Tables the schema creates, in creation order.
pub const TABLES: [&str; 6] = [
    "MediaItems",
    "Collections",
    "Tags",
    "ItemTags",
    "CollectionItems",
    "CollectionTags",
];

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_creates_all_tables() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        for table in TABLES {
            let exists: bool = conn
                .query_row(
                    "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?)",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert!(exists, "missing table {table}");
        }
    }

    #[test]
    fn test_sentinel_tag_is_bootstrapped() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        let name: String = conn
            .query_row("SELECT Name FROM Tags WHERE Id = ?", [SENTINEL_TAG_ID], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(name, SENTINEL_TAG_NAME);
    }
}
