use anyhow::Result;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Find regular files under `directory` whose extension is in `extensions`
/// (case-insensitive), sorted by path.
pub fn discover_media(directory: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    if !directory.is_dir() {
        anyhow::bail!("Not a directory: {}", directory.display());
    }

    let wanted: Vec<String> = extensions.iter().map(|e| e.to_lowercase()).collect();
    let mut files = Vec::new();

    for entry in WalkDir::new(directory)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if let Some(ext) = path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            if wanted.contains(&ext_lower) {
                files.push(path.to_path_buf());
            }
        }
    }

    files.sort();

    Ok(files)
}
