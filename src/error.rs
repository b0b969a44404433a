/// Error taxonomy for the album store and its collaborators
///
/// Almost every error here is recoverable: per-entry problems are collected as
/// warnings during a load and the entry is dropped. Only a failed document write is
/// handed back to the caller, since it means changes are not durable.

use std::path::PathBuf;
use thiserror::Error;

use crate::state::data::RecordId;

pub type AlbumResult<T> = Result<T, AlbumError>;

#[derive(Debug, Error)]
pub enum AlbumError {
    /// The persisted document could not be read or parsed; an empty one was substituted
    #[error("album document {path} is unreadable: {reason}")]
    DocumentUnreadable { path: PathBuf, reason: String },

    /// An album entry is not an object, or has a missing/mistyped field
    #[error("malformed album entry: {0}")]
    MalformedEntry(String),

    /// `position` / `rotation` is missing or not a 3-element number array
    #[error("field \"{field}\" must be an array [x, y, z] (got {found})")]
    MalformedVector { field: &'static str, found: String },

    /// `color` is neither a number array nor a hex string
    #[error("\"color\" must be [r, g, b, a?] or a hex string (got {0})")]
    MalformedColor(String),

    /// A second album entry pointing at an already placed file
    #[error("duplicate album entry for {0}")]
    DuplicateEntry(String),

    /// A referenced picture does not exist on disk
    #[error("picture file not found: {0}")]
    MissingFile(String),

    /// The image exists but could not be turned into a visual
    #[error("could not build picture {path}: {reason}")]
    VisualBuildFailure { path: PathBuf, reason: String },

    #[error("could not decode image {path}: {source}")]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The document could not be written; in-memory state is still authoritative
    #[error("could not write album document {path}: {source}")]
    DocumentWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no scene has been loaded")]
    NoActiveScene,

    #[error("the stash of scene \"{0}\" is empty")]
    StashEmpty(String),

    /// A record refers to an album entry that is no longer in the document
    #[error("no album entry with path {0}")]
    UnknownEntry(String),

    #[error("no live picture with id {0}")]
    UnknownRecord(RecordId),
}

impl AlbumError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedEntry(msg.into())
    }

    pub fn visual_build(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::VisualBuildFailure {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// True for errors that only cost a single entry during a load
    pub fn is_entry_level(&self) -> bool {
        matches!(
            self,
            Self::MalformedEntry(_)
                | Self::MalformedVector { .. }
                | Self::MalformedColor(_)
                | Self::DuplicateEntry(_)
                | Self::MissingFile(_)
                | Self::VisualBuildFailure { .. }
                | Self::ImageDecode { .. }
        )
    }
}
