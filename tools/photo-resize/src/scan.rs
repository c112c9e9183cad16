//! Source photo discovery.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extensions picked up by the resize pass. Matching is case-sensitive, so
/// `photo.Jpg` is left alone.
pub const SOURCE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".JPG", ".JPEG"];

/// Whether a file name carries one of [`SOURCE_EXTENSIONS`].
pub fn is_source_name(name: &str) -> bool {
    SOURCE_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

/// Regular files directly inside `dir` with a JPEG extension, sorted by path.
pub fn find_jpegs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.with_context(|| format!("Failed to list {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if is_source_name(&name) {
            found.push(entry.into_path());
        }
    }

    found.sort();
    Ok(found)
}
