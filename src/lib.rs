//! Media catalog: file metadata in a single SQLite file, with many-to-many
//! tagging, collections and filtered listings.
//!
//! ```no_run
//! use media_organizer::{filter_from_str, Catalog, MediaItem, SortMode};
//!
//! # fn main() -> media_organizer::Result<()> {
//! let catalog = Catalog::create("holiday")?;
//! catalog.add_item(&MediaItem::new("/media/beach.mp4", "mp4", 1024, 1_700_000_000))?;
//! catalog.add_tag("summer")?;
//! catalog.add_tag_to_item("/media/beach.mp4", "summer")?;
//!
//! let filter = filter_from_str("#summer beach");
//! let items = catalog.list_items(Some(&filter), SortMode::Size, true)?;
//! assert_eq!(items.len(), 1);
//! catalog.discard()?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod logging;
pub mod scanner;

pub use db::{
    filter_from_str, Catalog, Collection, Filter, MediaItem, SortMode, ORGANIZER_DATABASE_NAME,
    SENTINEL_TAG_NAME,
};
pub use error::{CatalogError, ErrorKind, Result};
