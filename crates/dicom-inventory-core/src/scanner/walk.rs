use crate::error::Error;
use glob::Pattern;
use std::path::{Path, PathBuf};
use tracing::{error, warn};
use walkdir::{DirEntry, WalkDir};

/// Selects acquisition files by extension and ignore globs.
#[derive(Debug, Clone)]
pub struct FileFilter {
    extension: String,
    ignore_patterns: Vec<Pattern>,
}

impl FileFilter {
    pub fn new(extension: &str, ignore_globs: &[String]) -> Self {
        let ignore_patterns = ignore_globs
            .iter()
            .filter_map(|glob| match Pattern::new(glob) {
                Ok(p) => Some(p),
                Err(e) => {
                    error!("Invalid glob pattern '{}': {}", glob, e);
                    None
                }
            })
            .collect();
        Self {
            extension: extension.trim_start_matches('.').to_lowercase(),
            ignore_patterns,
        }
    }

    fn is_ignored(&self, path: &Path) -> bool {
        self.ignore_patterns
            .iter()
            .any(|pattern| pattern.matches_path(path))
    }

    fn is_acquisition(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase() == self.extension)
            .unwrap_or(false)
    }
}

impl Default for FileFilter {
    fn default() -> Self {
        Self::new("dcm", &[])
    }
}

fn walk<'a>(root: &Path, filter: &'a FileFilter) -> impl Iterator<Item = DirEntry> + 'a {
    WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(move |entry| !filter.is_ignored(entry.path()))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!("Skipping unreadable path: {}", err);
                None
            }
        })
        .filter(move |entry| entry.file_type().is_file() && filter.is_acquisition(entry.path()))
}

/// All acquisition files under `root` in a stable order (sorted by name at
/// every directory level). A missing or unreadable root yields no files.
pub fn collect_acquisition_files(root: &Path, filter: &FileFilter) -> Vec<PathBuf> {
    walk(root, filter).map(DirEntry::into_path).collect()
}

/// Directory levels between `folder` and the shallowest acquisition file.
pub fn detect_depth(folder: &Path, filter: &FileFilter) -> Result<usize, Error> {
    walk(folder, filter)
        .map(|entry| entry.depth().saturating_sub(1))
        .min()
        .ok_or_else(|| Error::NoAcquisitions(folder.to_path_buf()))
}
