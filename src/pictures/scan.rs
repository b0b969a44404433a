/// Listing picture files in a folder
///
/// Only the top level of a folder is scanned; sub-folders are ignored.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Image extensions the album picks up (compared case-insensitively)
const PICTURE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Check whether a path looks like a picture by its extension
pub fn is_picture_file(path: &Path) -> bool {
    match path.extension() {
        Some(ext) => {
            let ext = ext.to_string_lossy().to_lowercase();
            PICTURE_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}

/// All picture files directly inside `dir`, sorted by file name.
///
/// A missing or unreadable folder yields an empty list.
pub fn list_pictures(dir: &Path) -> Vec<PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }

    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| is_picture_file(p))
        .collect()
}

/// A picture file together with the time it was created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureFile {
    pub path: PathBuf,
    pub created: DateTime<Utc>,
}

/// The most recently created picture in `dir` (e.g. a camera's output folder).
///
/// Falls back to the modification time on filesystems without creation times.
/// Ties keep the file that sorts first by name.
pub fn latest_capture(dir: &Path) -> Option<CaptureFile> {
    let mut latest: Option<CaptureFile> = None;

    for path in list_pictures(dir) {
        let Ok(meta) = std::fs::metadata(&path) else {
            continue;
        };
        let Ok(time) = meta.created().or_else(|_| meta.modified()) else {
            continue;
        };
        let created = DateTime::<Utc>::from(time);

        let newer = latest.as_ref().map_or(true, |l| created > l.created);
        if newer {
            latest = Some(CaptureFile { path, created });
        }
    }

    latest
}
