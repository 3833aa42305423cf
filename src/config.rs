use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::db::SortMode;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub listing: ListingConfig,

    #[serde(default)]
    pub scanner: ScannerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Directory holding catalog working files.
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// Catalog name used when none is given on the command line.
    #[serde(default = "default_catalog_name")]
    pub name: String,
}

fn default_work_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("media-organizer")
}

fn default_catalog_name() -> String {
    "organizer".to_string()
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
            name: default_catalog_name(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingConfig {
    #[serde(default)]
    pub sort: SortMode,

    #[serde(default = "default_descending")]
    pub descending: bool,
}

fn default_descending() -> bool {
    true
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            sort: SortMode::default(),
            descending: default_descending(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Extensions of files picked up by directory scans.
    #[serde(default = "default_media_extensions")]
    pub extensions: Vec<String>,
}

fn default_media_extensions() -> Vec<String> {
    [
        "jpg", "jpeg", "png", "gif", "webp", "heic", "mp4", "mkv", "mov", "avi", "webm", "mp3",
        "flac", "ogg", "wav",
    ]
    .iter()
    .map(|e| e.to_string())
    .collect()
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            extensions: default_media_extensions(),
        }
    }
}

impl Config {
    /// Load from `MEDIA_ORGANIZER_CONFIG` or the default location, writing
    /// defaults out if no file exists yet.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var_os("MEDIA_ORGANIZER_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(Self::config_path);
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {:?}", path))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Invalid config {:?}", path))?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("media-organizer")
    }

    fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_config_writes_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config, Config::default());
        assert!(path.exists());
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[listing]\nsort = \"size\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.listing.sort, SortMode::Size);
        assert!(config.listing.descending);
        assert_eq!(config.catalog.name, "organizer");
        assert!(config.scanner.extensions.contains(&"mp4".to_string()));
    }
}
