//! Read-side queries: item listings and tag listings.
//!
//! Every listing is fully materialized before the connection closes, so
//! callers may mutate the catalog while holding results.

use rusqlite::params_from_iter;

use super::filter::{Filter, SortMode};
use super::items::{MediaItem, ITEM_COLUMNS};
use super::schema::SENTINEL_TAG_ID;
use super::Catalog;
use crate::error::Result;

impl Catalog {
    /// List catalogued items, optionally filtered, ordered by `sort`.
    ///
    /// Only items carrying the sentinel tag are listed. Ties on the sort field
    /// are broken by path in the same direction.
    pub fn list_items(
        &self,
        filter: Option<&Filter>,
        sort: SortMode,
        descending: bool,
    ) -> Result<Vec<MediaItem>> {
        let predicate = filter.and_then(Filter::predicate);
        let direction = if descending { "DESC" } else { "ASC" };

        let mut sql = format!(
            "SELECT DISTINCT {} FROM MediaItems m \
             JOIN ItemTags it ON it.Item = m.Path AND it.TagId = {}",
            ITEM_COLUMNS, SENTINEL_TAG_ID
        );
        let mut params = Vec::new();
        if let Some(predicate) = predicate {
            sql.push_str(" WHERE ");
            sql.push_str(&predicate.sql);
            params = predicate.params;
        }
        sql.push_str(&format!(" ORDER BY {} {}", sort.column(), direction));
        if sort != SortMode::Filename {
            sql.push_str(&format!(", m.Path {}", direction));
        }

        self.with_connection("list_items", |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let items = stmt
                .query_map(params_from_iter(params.iter()), MediaItem::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(items)
        })
    }

    /// Tags attached to `path`, sentinel excluded, in the order they were
    /// first attached.
    pub fn list_item_tags(&self, path: &str) -> Result<Vec<String>> {
        self.with_connection("list_item_tags", |conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT t.Name
                FROM ItemTags it
                JOIN Tags t ON t.Id = it.TagId
                WHERE it.Item = ? AND t.Id <> ?
                GROUP BY t.Id
                ORDER BY MIN(it.rowid)
                "#,
            )?;
            let tags = stmt
                .query_map(rusqlite::params![path, SENTINEL_TAG_ID], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            Ok(tags)
        })
    }

    /// Every tag in the catalog, sentinel excluded, in creation order.
    pub fn list_all_tags(&self) -> Result<Vec<String>> {
        self.with_connection("list_all_tags", |conn| {
            let mut stmt = conn.prepare("SELECT Name FROM Tags WHERE Id <> ? ORDER BY Id")?;
            let tags = stmt
                .query_map([SENTINEL_TAG_ID], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            Ok(tags)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::filter_from_str;
    use crate::db::SENTINEL_TAG_NAME;
    use tempfile::tempdir;

    fn item(path: &str, size: i64, modified: i64) -> MediaItem {
        MediaItem::new(path, "mp4", size, modified).with_name("NameUwau")
    }

    fn paths(items: &[MediaItem]) -> Vec<&str> {
        items.iter().map(|i| i.path.as_str()).collect()
    }

    fn seeded(dir: &std::path::Path, name: &str) -> Catalog {
        let catalog = Catalog::create_in(dir, name).unwrap();
        catalog.add_item(&item("Bababooey1", 289, 1)).unwrap();
        catalog.add_item(&item("Bababooey2", 999, 99)).unwrap();
        catalog.add_item(&item("Bababooey3", 102, 2)).unwrap();
        catalog
    }

    #[test]
    fn test_sort_by_size() {
        let dir = tempdir().unwrap();
        let catalog = seeded(dir.path(), "sort_size");

        let items = catalog.list_items(None, SortMode::Size, true).unwrap();
        let sizes: Vec<i64> = items.iter().map(|i| i.size).collect();
        assert_eq!(sizes, vec![999, 289, 102]);

        let items = catalog.list_items(None, SortMode::Size, false).unwrap();
        let sizes: Vec<i64> = items.iter().map(|i| i.size).collect();
        assert_eq!(sizes, vec![102, 289, 999]);
    }

    #[test]
    fn test_sort_by_modified() {
        let dir = tempdir().unwrap();
        let catalog = seeded(dir.path(), "sort_modified");

        let items = catalog.list_items(None, SortMode::Modified, true).unwrap();
        let modified: Vec<i64> = items.iter().map(|i| i.modified).collect();
        assert_eq!(modified, vec![99, 2, 1]);
    }

    #[test]
    fn test_sort_by_path() {
        let dir = tempdir().unwrap();
        let catalog = seeded(dir.path(), "sort_path");

        let items = catalog.list_items(None, SortMode::Filename, true).unwrap();
        assert_eq!(paths(&items), vec!["Bababooey3", "Bababooey2", "Bababooey1"]);
    }

    #[test]
    fn test_tag_filter() {
        let dir = tempdir().unwrap();
        let catalog = Catalog::create_in(dir.path(), "tag_filter").unwrap();
        let expected = item("Bababooey1", 999, 1);
        catalog.add_item(&expected).unwrap();
        catalog.add_item(&item("Bababooey2", 102, 1)).unwrap();
        catalog.add_tag("cool-item").unwrap();
        catalog.add_tag_to_item(&expected.path, "cool-item").unwrap();

        let filter = Filter::with_tags(["cool-item"]);
        let items = catalog.list_items(Some(&filter), SortMode::Size, true).unwrap();
        assert_eq!(items, vec![expected]);
    }

    #[test]
    fn test_all_tags_must_match() {
        let dir = tempdir().unwrap();
        let catalog = seeded(dir.path(), "all_tags");
        for tag in ["a", "b"] {
            catalog.add_tag(tag).unwrap();
        }
        catalog.add_tag_to_item("Bababooey1", "a").unwrap();
        catalog.add_tag_to_item("Bababooey1", "b").unwrap();
        catalog.add_tag_to_item("Bababooey2", "a").unwrap();

        let filter = Filter::with_tags(["a", "b"]);
        let items = catalog.list_items(Some(&filter), SortMode::Filename, false).unwrap();
        assert_eq!(paths(&items), vec!["Bababooey1"]);
    }

    #[test]
    fn test_tags_and_any_filename() {
        let dir = tempdir().unwrap();
        let catalog = Catalog::create_in(dir.path(), "mixed").unwrap();
        for path in ["trip/beach.mp4", "trip/hotel.jpg", "home/cat.mp4", "trip/notes.txt"] {
            catalog.add_item(&MediaItem::new(path, "x", 1, 1)).unwrap();
        }
        catalog.add_tag("trip").unwrap();
        for path in ["trip/beach.mp4", "trip/hotel.jpg", "trip/notes.txt"] {
            catalog.add_tag_to_item(path, "trip").unwrap();
        }

        let filter = Filter {
            tags: vec!["trip".into()],
            filenames: vec!["%.mp4".into(), "%.jpg".into()],
            escaped: false,
        };
        let items = catalog.list_items(Some(&filter), SortMode::Filename, false).unwrap();
        assert_eq!(paths(&items), vec!["trip/beach.mp4", "trip/hotel.jpg"]);
    }

    #[test]
    fn test_free_text_filter() {
        let dir = tempdir().unwrap();
        let catalog = seeded(dir.path(), "free_text");
        catalog.add_tag("fav").unwrap();
        catalog.add_tag_to_item("Bababooey3", "fav").unwrap();
        catalog.add_tag_to_item("Bababooey2", "fav").unwrap();

        let filter = filter_from_str("#fav booey3");
        let items = catalog.list_items(Some(&filter), SortMode::Modified, true).unwrap();
        assert_eq!(paths(&items), vec!["Bababooey3"]);
    }

    #[test]
    fn test_backslash_paths_match_plain_patterns() {
        let dir = tempdir().unwrap();
        let catalog = Catalog::create_in(dir.path(), "windows").unwrap();
        catalog.add_item(&item(r"C:\Videos\a.mp4", 1, 1)).unwrap();
        catalog.add_item(&item(r"C:\Other\b.mp4", 2, 2)).unwrap();

        let filter = Filter::with_filenames([r"C:\Videos\%"]);
        let items = catalog.list_items(Some(&filter), SortMode::Modified, true).unwrap();
        assert_eq!(paths(&items), vec![r"C:\Videos\a.mp4"]);

        let typed = filter_from_str(r"Videos\a");
        let items = catalog.list_items(Some(&typed), SortMode::Modified, true).unwrap();
        assert_eq!(paths(&items), vec![r"C:\Videos\a.mp4"]);
    }

    #[test]
    fn test_quote_characters_are_data() {
        let dir = tempdir().unwrap();
        let catalog = Catalog::create_in(dir.path(), "quotes").unwrap();
        let tricky = MediaItem::new("it's here.mp4", "mp4", 1, 1);
        catalog.add_item(&tricky).unwrap();
        catalog.add_tag("o'clock").unwrap();
        catalog.add_tag_to_item(&tricky.path, "o'clock").unwrap();

        let filter = Filter {
            tags: vec!["o'clock".into()],
            filenames: vec!["it's%".into()],
            escaped: false,
        };
        let items = catalog.list_items(Some(&filter), SortMode::Modified, true).unwrap();
        assert_eq!(items, vec![tricky]);

        let injected = Filter::with_tags(["x' OR '1'='1"]);
        assert!(catalog
            .list_items(Some(&injected), SortMode::Modified, true)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_duplicate_association_lists_once() {
        let dir = tempdir().unwrap();
        let catalog = seeded(dir.path(), "dup_assoc");
        catalog.add_tag("twice").unwrap();
        catalog.add_tag_to_item("Bababooey1", "twice").unwrap();
        catalog.add_tag_to_item("Bababooey1", "twice").unwrap();

        let filter = Filter::with_tags(["twice"]);
        assert_eq!(catalog.list_items(Some(&filter), SortMode::Size, true).unwrap().len(), 1);
        assert_eq!(catalog.list_item_tags("Bababooey1").unwrap(), vec!["twice"]);
    }

    #[test]
    fn test_sentinel_never_listed() {
        let dir = tempdir().unwrap();
        let catalog = seeded(dir.path(), "sentinel");
        assert!(catalog.list_all_tags().unwrap().is_empty());
        assert!(catalog.list_item_tags("Bababooey1").unwrap().is_empty());

        catalog.add_tag("cool").unwrap();
        let tags = catalog.list_all_tags().unwrap();
        assert_eq!(tags, vec!["cool"]);
        assert!(!tags.iter().any(|t| t == SENTINEL_TAG_NAME));
    }

    #[test]
    fn test_listing_is_detached_from_store() {
        let dir = tempdir().unwrap();
        let catalog = seeded(dir.path(), "detached");

        let items = catalog.list_items(None, SortMode::Modified, true).unwrap();
        for item in &items {
            catalog.remove_item(&item.path).unwrap();
        }
        assert_eq!(items.len(), 3);
        assert!(catalog.list_items(None, SortMode::Modified, true).unwrap().is_empty());
    }
}
