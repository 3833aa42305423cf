use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use crate::db::MediaItem;

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    /// Guess the format from an output file name, defaulting to JSON.
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| e.parse().ok())
            .unwrap_or(ExportFormat::Json)
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(format!("unknown export format: {}", other)),
        }
    }
}

/// Write a listing to `output_path`. Returns the number of items written.
pub fn export_items(items: &[MediaItem], output_path: &Path, format: ExportFormat) -> Result<usize> {
    match format {
        ExportFormat::Json => export_json(items, output_path),
        ExportFormat::Csv => export_csv(items, output_path),
    }
    .with_context(|| format!("Failed to export to {}", output_path.display()))?;

    Ok(items.len())
}

fn export_json(items: &[MediaItem], output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(items)?;
    let mut file = File::create(output_path)?;
    file.write_all(json.as_bytes())?;
    Ok(())
}

fn export_csv(items: &[MediaItem], output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;

    wtr.write_record(["path", "type", "size", "modified", "name", "description"])?;

    for item in items {
        wtr.write_record([
            item.path.as_str(),
            item.file_type.as_str(),
            &item.size.to_string(),
            &item.modified.to_string(),
            item.name.as_deref().unwrap_or(""),
            item.description.as_deref().unwrap_or(""),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
