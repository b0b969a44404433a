/// State management module
///
/// This module handles all album state, including:
/// - The album document and its scene collections (document.rs)
/// - Typed album entries parsed from the document (entry.rs)
/// - Runtime picture records (data.rs)
/// - Building and destroying live pictures through the host (visual.rs)
/// - Resumable scene loading (load.rs)
/// - The store that keeps album, stash and pictures folder consistent (library.rs)

pub mod data;
pub mod document;
pub mod entry;
pub mod library;
pub mod load;
pub mod visual;

pub use data::{EntryKey, LiveHandle, PictureRecord, Pictures, RecordId, VisualId};
pub use document::{AlbumDocument, SceneCollection};
pub use entry::AlbumEntry;
pub use library::AlbumStore;
pub use load::{LoadOutcome, LoadStep, LoadTask};
pub use visual::{dematerialize, materialize, VisualBuilder};
