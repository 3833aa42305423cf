//! Directory scanning: turns files on disk into catalog items.

pub mod discovery;

use anyhow::{Context, Result};
use std::path::Path;
use std::time::UNIX_EPOCH;
use tracing::{debug, info};

use crate::config::ScannerConfig;
use crate::db::{Catalog, MediaItem};
use crate::error::ErrorKind;

pub use discovery::discover_media;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    pub total_found: usize,
    pub added: usize,
    /// Files already in the catalog
    pub skipped: usize,
}

/// Build an item from filesystem metadata. Name and description stay empty.
pub fn item_from_path(path: &Path) -> Result<MediaItem> {
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("Failed to stat {}", path.display()))?;

    let file_type = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let modified = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);

    Ok(MediaItem::new(
        path.to_string_lossy(),
        file_type,
        metadata.len() as i64,
        modified,
    ))
}

pub struct Scanner {
    config: ScannerConfig,
}

impl Scanner {
    pub fn new(config: ScannerConfig) -> Self {
        Self { config }
    }

    /// Add every matching file under `directory` to the catalog.
    ///
    /// Files whose path is already catalogued are skipped; any other failure
    /// stops the scan.
    pub fn scan_directory(&self, catalog: &Catalog, directory: &Path) -> Result<ScanResult> {
        let files = discover_media(directory, &self.config.extensions)?;
        let mut result = ScanResult {
            total_found: files.len(),
            ..Default::default()
        };

        for path in &files {
            let item = item_from_path(path)?;
            match catalog.add_item(&item) {
                Ok(()) => result.added += 1,
                Err(e) if e.kind() == ErrorKind::Constraint => {
                    debug!(path = %item.path, "already catalogued");
                    result.skipped += 1;
                }
                Err(e) => return Err(e).context(format!("Failed to add {}", path.display())),
            }
        }

        info!(
            "Scanned {}: {} found, {} added, {} skipped",
            directory.display(),
            result.total_found,
            result.added,
            result.skipped
        );
        Ok(result)
    }
}
