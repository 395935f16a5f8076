//! Discovery of extracted image files on disk.

use crate::core::constants::IMAGE_EXTENSIONS;
use crate::core::errors::ReportResult;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// True when `path` has one of the supported image extensions, in any case.
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Recursively lists the image files below `dir`, sorted by path.
pub fn collect_images(dir: impl AsRef<Path>) -> ReportResult<Vec<PathBuf>> {
    let mut images = Vec::new();
    for entry in WalkDir::new(dir.as_ref()).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        if entry.file_type().is_file() && is_image_file(entry.path()) {
            images.push(entry.into_path());
        }
    }
    images.sort();
    tracing::debug!("found {} images under {}", images.len(), dir.as_ref().display());
    Ok(images)
}
