/// Album settings and on-disk locations
///
/// Settings are the per-installation defaults applied to pictures that do not
/// override them in the album document. They serialize to JSON so a host can
/// persist them however it likes.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::color::FrameColor;

/// Name of the folder holding everything the album owns
const APP_DIR: &str = "photo-album";
/// Folder (inside the app dir) scanned for images
const PICTURES_DIR: &str = "pictures";
/// The album document
const DOCUMENT_FILE: &str = "album.json";

/// Defaults and tuning values for pictures and hand interaction
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct AlbumSettings {
    /// Frame color for pictures without a `color` field
    pub default_color: FrameColor,
    /// Border between the image and the frame edge, on each side (meters)
    pub default_padding: f32,
    /// Frame depth (meters)
    pub default_thickness: f32,
    /// Size of the longest side for pictures without an explicit size (meters)
    pub default_size: f32,
    /// Upper bound for both width and height (meters)
    pub max_size: f32,
    /// Pre-blend transparent pixels onto the frame color
    pub alpha_blend: bool,
    /// Whether pictures are visible unless they say otherwise
    pub visible: bool,
    /// A hand closer than this to a frame can grab it (meters)
    pub hold_distance: f32,
    /// Analog trigger/grip value above which the hand counts as closed
    pub grip_threshold: f32,
}

impl Default for AlbumSettings {
    fn default() -> Self {
        Self {
            default_color: FrameColor::default(),
            default_padding: 0.01,
            default_thickness: 0.01,
            default_size: 0.5,
            max_size: 10.0,
            alpha_blend: false,
            visible: true,
            hold_distance: 0.05,
            grip_threshold: 0.5,
        }
    }
}

impl AlbumSettings {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Where the album document and the pictures folder live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumPaths {
    root: PathBuf,
    pictures: PathBuf,
    document: PathBuf,
}

impl AlbumPaths {
    /// Lay out the album under an arbitrary root directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            pictures: root.join(PICTURES_DIR),
            document: root.join(DOCUMENT_FILE),
            root,
        }
    }

    /// The per-user location:
    /// - Linux: ~/.local/share/photo-album
    /// - macOS: ~/Library/Application Support/photo-album
    /// - Windows: %APPDATA%\photo-album
    ///
    /// Returns `None` when neither a data dir nor a home dir can be determined.
    pub fn user_data() -> Option<Self> {
        let base = dirs::data_dir().or_else(dirs::home_dir)?;
        Some(Self::new(base.join(APP_DIR)))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn pictures_dir(&self) -> &Path {
        &self.pictures
    }

    pub fn document(&self) -> &Path {
        &self.document
    }

    /// Create the root and pictures folders if they are missing
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.root)?;
        fs::create_dir_all(&self.pictures)?;
        Ok(())
    }
}
