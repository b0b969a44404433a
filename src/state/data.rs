/// Shared data structures for the album state
///
/// These structs represent the runtime working set: one `PictureRecord` per
/// picture in the scene, collected in `Pictures`.

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use cgmath::Vector3;

use crate::color::FrameColor;
use crate::config::AlbumSettings;
use crate::spatial::transform::quaternion_to_euler;
use crate::spatial::{AnchorFrames, OrientedBox, PictureNode, Transform};
use crate::state::entry::AlbumEntry;

static NEXT_RECORD_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(u64);

impl RecordId {
    pub fn next() -> Self {
        Self(NEXT_RECORD_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Opaque handle returned by the visual builder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VisualId(pub u64);

/// Key of a record's entry in the scene's album array (its stored path)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntryKey(pub String);

/// Runtime-only half of a record
#[derive(Debug, Clone, PartialEq)]
pub struct LiveHandle {
    pub visual: VisualId,
    pub node: PictureNode,
}

/// Represents a single picture in the scene
#[derive(Debug, Clone, PartialEq)]
pub struct PictureRecord {
    pub id: RecordId,
    /// Path as stored in the document
    pub path: String,
    /// The file `path` resolved to
    pub resolved: PathBuf,
    pub position: Vector3<f32>,
    /// Euler angles in degrees
    pub rotation: Vector3<f32>,
    /// Outer frame size; zero means "not derived yet"
    pub width: f32,
    pub height: f32,
    /// Border on each side of the image
    pub padding: f32,
    pub thickness: f32,
    pub color: FrameColor,
    pub alpha_blend: bool,
    pub visible: bool,
    /// Album entry this record was parsed from; `None` while ephemeral
    pub entry: Option<EntryKey>,
    pub live: Option<LiveHandle>,
}

impl PictureRecord {
    /// Record for a parsed album entry, with defaults filled in
    pub fn from_entry(entry: &AlbumEntry, resolved: PathBuf, settings: &AlbumSettings) -> Self {
        Self {
            id: RecordId::next(),
            path: entry.path.clone(),
            resolved,
            position: entry.position,
            rotation: entry.rotation,
            width: entry.width.unwrap_or(0.0),
            height: entry.height.unwrap_or(0.0),
            padding: entry.padding.unwrap_or(settings.default_padding),
            thickness: entry.thickness.unwrap_or(settings.default_thickness),
            color: entry.color.unwrap_or(settings.default_color),
            alpha_blend: entry.alpha.unwrap_or(settings.alpha_blend),
            visible: entry.visible.unwrap_or(settings.visible),
            entry: Some(EntryKey(entry.path.clone())),
            live: None,
        }
    }

    /// Record that is not (yet) part of the album document
    pub fn ephemeral(
        path: impl Into<String>,
        resolved: PathBuf,
        position: Vector3<f32>,
        rotation: Vector3<f32>,
        settings: &AlbumSettings,
    ) -> Self {
        let entry = AlbumEntry::placed(path, position, rotation);
        let mut record = Self::from_entry(&entry, resolved, settings);
        record.entry = None;
        record
    }

    /// Padding across the whole picture (both sides)
    pub fn border(&self) -> f32 {
        2.0 * self.padding
    }

    pub fn is_persisted(&self) -> bool {
        self.entry.is_some()
    }

    pub fn node(&self) -> Option<&PictureNode> {
        self.live.as_ref().map(|live| &live.node)
    }

    pub fn node_mut(&mut self) -> Option<&mut PictureNode> {
        self.live.as_mut().map(|live| &mut live.node)
    }

    /// The frame box in world space, if the picture is materialized
    pub fn bounds(&self, anchors: &AnchorFrames) -> Option<OrientedBox> {
        let node = self.node()?;
        let world = node.world(anchors);
        Some(OrientedBox::new(
            node.frame_center(anchors),
            world.rotation,
            Vector3::new(self.width, self.height, self.thickness) * 0.5,
        ))
    }

    /// Copy the live pose (relative to the album root) and size back into the
    /// persisted fields
    pub fn sync_from_node(&mut self, anchors: &AnchorFrames) {
        let Some(node) = self.node() else {
            return;
        };
        let placement = Transform::relative_to(&node.world(anchors), &anchors.album_root);
        let size = node.world_size(anchors);

        self.position = placement.position;
        self.rotation = quaternion_to_euler(placement.rotation);
        self.width = size.width;
        self.height = size.height;
    }
}

/// The pictures of the current scene, in album order
#[derive(Debug, Default, Clone)]
pub struct Pictures {
    records: Vec<PictureRecord>,
}

impl Pictures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: PictureRecord) -> RecordId {
        let id = record.id;
        self.records.push(record);
        id
    }

    pub fn get(&self, id: RecordId) -> Option<&PictureRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn get_mut(&mut self, id: RecordId) -> Option<&mut PictureRecord> {
        self.records.iter_mut().find(|r| r.id == id)
    }

    pub fn remove(&mut self, id: RecordId) -> Option<PictureRecord> {
        let index = self.records.iter().position(|r| r.id == id)?;
        Some(self.records.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &PictureRecord> {
        self.records.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut PictureRecord> {
        self.records.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Empty the set, handing back every record (e.g. on scene change)
    pub fn drain(&mut self) -> Vec<PictureRecord> {
        std::mem::take(&mut self.records)
    }
}

impl Extend<PictureRecord> for Pictures {
    fn extend<T: IntoIterator<Item = PictureRecord>>(&mut self, iter: T) {
        self.records.extend(iter);
    }
}

impl FromIterator<PictureRecord> for Pictures {
    fn from_iter<T: IntoIterator<Item = PictureRecord>>(iter: T) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}
