/// Resolution of stored picture paths
///
/// The album document stores either absolute paths or names relative to the
/// pictures folder. Resolved paths are canonicalized so that two spellings of the
/// same file compare equal.

use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolver {
    pictures_dir: PathBuf,
}

impl PathResolver {
    pub fn new(pictures_dir: impl Into<PathBuf>) -> Self {
        Self {
            pictures_dir: pictures_dir.into(),
        }
    }

    pub fn pictures_dir(&self) -> &Path {
        &self.pictures_dir
    }

    /// Resolve a stored path to an existing file.
    ///
    /// Absolute paths are taken as-is, anything else is looked up inside the
    /// pictures folder. Returns `None` when the file does not exist.
    pub fn resolve(&self, stored: &str) -> Option<PathBuf> {
        if stored.trim().is_empty() {
            return None;
        }

        let path = Path::new(stored);
        let candidate = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.pictures_dir.join(path)
        };

        if !candidate.is_file() {
            return None;
        }
        Some(fs::canonicalize(&candidate).unwrap_or(candidate))
    }

    /// The string to store for a file: its bare name when it sits directly in the
    /// pictures folder, its full path otherwise.
    pub fn stored_name(&self, file: &Path) -> String {
        let canonical_dir = fs::canonicalize(&self.pictures_dir).unwrap_or_else(|_| self.pictures_dir.clone());
        let canonical_file = fs::canonicalize(file).unwrap_or_else(|_| file.to_path_buf());

        match (canonical_file.parent(), canonical_file.file_name()) {
            (Some(parent), Some(name)) if parent == canonical_dir => {
                name.to_string_lossy().to_string()
            }
            _ => file.to_string_lossy().to_string(),
        }
    }
}
