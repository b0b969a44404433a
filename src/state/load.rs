/// Scene loading, one album entry at a time
///
/// A `LoadTask` owns its own copy of the document, so the store is only changed
/// when the finished task is handed back to `AlbumStore::finish_load`. Dropping
/// a task half way leaves no trace apart from the visuals already built, which
/// `cancel` destroys.

use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::AlbumSettings;
use crate::error::AlbumError;
use crate::pictures::{ImageSource, PathResolver};
use crate::state::data::{PictureRecord, Pictures};
use crate::state::document::{AlbumDocument, SceneCollection};
use crate::state::entry::AlbumEntry;
use crate::state::visual::{dematerialize, materialize, VisualBuilder};

/// Result of a single `LoadTask::step`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStep {
    /// More entries are waiting
    Pending,
    /// Every entry has been processed
    Complete,
}

#[derive(Debug)]
pub struct LoadTask {
    scene: String,
    document: AlbumDocument,
    collection: SceneCollection,
    pending: VecDeque<Value>,
    kept: Vec<Value>,
    records: Vec<PictureRecord>,
    placed: HashSet<PathBuf>,
    warnings: Vec<AlbumError>,
    resolver: PathResolver,
    settings: AlbumSettings,
}

/// Everything a finished task produced
#[derive(Debug)]
pub(crate) struct LoadParts {
    pub scene: String,
    pub document: AlbumDocument,
    pub collection: SceneCollection,
    pub records: Vec<PictureRecord>,
    pub warnings: Vec<AlbumError>,
}

impl LoadTask {
    pub(crate) fn new(
        scene: &str,
        document: AlbumDocument,
        warnings: Vec<AlbumError>,
        resolver: PathResolver,
        settings: AlbumSettings,
    ) -> Self {
        let (mut collection, notes) = document.scene(scene);
        for note in notes {
            warn!(scene, "{note}");
        }
        let pending: VecDeque<Value> = std::mem::take(&mut collection.album).into();
        info!(scene, entries = pending.len(), "loading scene");

        Self {
            scene: scene.to_string(),
            document,
            collection,
            pending,
            kept: Vec::new(),
            records: Vec::new(),
            placed: HashSet::new(),
            warnings,
            resolver,
            settings,
        }
    }

    pub fn scene(&self) -> &str {
        &self.scene
    }

    /// Album entries not processed yet
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    pub fn is_complete(&self) -> bool {
        self.pending.is_empty()
    }

    /// Warnings collected so far
    pub fn warnings(&self) -> &[AlbumError] {
        &self.warnings
    }

    /// Process the next album entry
    pub fn step<I, B>(&mut self, images: &mut I, builder: &mut B) -> LoadStep
    where
        I: ImageSource + ?Sized,
        B: VisualBuilder + ?Sized,
    {
        let Some(raw) = self.pending.pop_front() else {
            return LoadStep::Complete;
        };

        match self.load_entry(&raw, images, builder) {
            Ok(record) => {
                debug!(path = %record.path, "picture placed");
                self.kept.push(raw);
                self.records.push(record);
            }
            Err(err) => {
                warn!(scene = %self.scene, %err, "dropping album entry");
                self.warnings.push(err);
            }
        }

        if self.pending.is_empty() {
            LoadStep::Complete
        } else {
            LoadStep::Pending
        }
    }

    fn load_entry<I, B>(&mut self, raw: &Value, images: &mut I, builder: &mut B) -> Result<PictureRecord, AlbumError>
    where
        I: ImageSource + ?Sized,
        B: VisualBuilder + ?Sized,
    {
        let entry = AlbumEntry::parse(raw)?;
        let resolved = self
            .resolver
            .resolve(&entry.path)
            .ok_or_else(|| AlbumError::MissingFile(entry.path.clone()))?;
        if self.placed.contains(&resolved) {
            return Err(AlbumError::DuplicateEntry(entry.path));
        }

        let mut record = PictureRecord::from_entry(&entry, resolved.clone(), &self.settings);
        materialize(&mut record, images, builder, &self.settings)?;
        self.placed.insert(resolved);
        Ok(record)
    }

    /// Run every remaining step
    pub fn run<I, B>(&mut self, images: &mut I, builder: &mut B)
    where
        I: ImageSource + ?Sized,
        B: VisualBuilder + ?Sized,
    {
        while self.step(images, builder) == LoadStep::Pending {}
    }

    /// Abandon the load and destroy the visuals built so far
    pub fn cancel<B: VisualBuilder + ?Sized>(mut self, builder: &mut B) {
        info!(scene = %self.scene, built = self.records.len(), "scene load cancelled");
        for record in &mut self.records {
            dematerialize(record, builder);
        }
    }

    pub(crate) fn into_parts(self) -> LoadParts {
        let mut collection = self.collection;
        // unprocessed entries stay in the album
        collection.album = self.kept.into_iter().chain(self.pending).collect();
        LoadParts {
            scene: self.scene,
            document: self.document,
            collection,
            records: self.records,
            warnings: self.warnings,
        }
    }
}

/// The records of a loaded scene and what went wrong on the way
#[derive(Debug)]
pub struct LoadOutcome {
    pub records: Pictures,
    pub warnings: Vec<AlbumError>,
}
