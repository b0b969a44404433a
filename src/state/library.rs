use std::collections::HashSet;
use std::path::{Path, PathBuf};

use cgmath::Vector3;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::config::{AlbumPaths, AlbumSettings};
use crate::error::{AlbumError, AlbumResult};
use crate::pictures::{latest_capture, list_pictures, ImageSource, PathResolver};
use crate::state::data::{EntryKey, PictureRecord, Pictures, RecordId};
use crate::state::document::{AlbumDocument, SceneCollection};
use crate::state::entry::{entry_path, number_json, vector_json, AlbumEntry};
use crate::state::load::{LoadOutcome, LoadTask};
use crate::state::visual::{dematerialize, materialize, VisualBuilder};

/// The scene whose pictures are live
#[derive(Debug)]
struct ActiveScene {
    name: String,
    collection: SceneCollection,
}

/// The AlbumStore owns the album document and keeps it consistent with the
/// pictures folder.
///
/// Every album mutation is followed by a stash reconciliation and a synchronous
/// save, so the file on disk always reflects the last completed action.
pub struct AlbumStore {
    paths: AlbumPaths,
    settings: AlbumSettings,
    resolver: PathResolver,
    document: AlbumDocument,
    active: Option<ActiveScene>,
    /// Files taken out of the stash that are not in the album yet
    spawned: HashSet<PathBuf>,
    /// Message of the last failed save, cleared by the next good one
    write_error: Option<String>,
}

impl AlbumStore {
    pub fn new(paths: AlbumPaths, settings: AlbumSettings) -> Self {
        let resolver = PathResolver::new(paths.pictures_dir());
        Self {
            paths,
            settings,
            resolver,
            document: AlbumDocument::new(),
            active: None,
            spawned: HashSet::new(),
            write_error: None,
        }
    }

    /// Store in the per-user data directory, with its folders created
    pub fn open_user_data(settings: AlbumSettings) -> AlbumResult<Self> {
        let paths = AlbumPaths::user_data().ok_or_else(|| AlbumError::DocumentWrite {
            path: PathBuf::from("photo-album"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no user data directory"),
        })?;
        paths.ensure_dirs().map_err(|source| AlbumError::DocumentWrite {
            path: paths.root().to_path_buf(),
            source,
        })?;
        info!(root = %paths.root().display(), "album store opened");
        Ok(Self::new(paths, settings))
    }

    pub fn paths(&self) -> &AlbumPaths {
        &self.paths
    }

    pub fn settings(&self) -> &AlbumSettings {
        &self.settings
    }

    /// New defaults apply to pictures materialized from now on
    pub fn set_settings(&mut self, settings: AlbumSettings) {
        self.settings = settings;
    }

    pub fn scene(&self) -> Option<&str> {
        self.active.as_ref().map(|active| active.name.as_str())
    }

    /// Stored paths currently in the stash of the active scene
    pub fn stash(&self) -> &[String] {
        self.active
            .as_ref()
            .map(|active| active.collection.stash.as_slice())
            .unwrap_or(&[])
    }

    pub fn album_len(&self) -> usize {
        self.active.as_ref().map_or(0, |active| active.collection.album.len())
    }

    /// Raw album entries of the active scene
    pub fn album(&self) -> &[Value] {
        self.active
            .as_ref()
            .map(|active| active.collection.album.as_slice())
            .unwrap_or(&[])
    }

    /// Why the last save failed, if it did
    pub fn write_error(&self) -> Option<&str> {
        self.write_error.as_deref()
    }

    // ---- Loading ----

    /// Start loading `scene` from the document on disk.
    ///
    /// Nothing in the store changes until the task is passed to `finish_load`.
    pub fn begin_load(&self, scene: &str) -> LoadTask {
        let (document, warnings) = AlbumDocument::read(self.paths.document());
        LoadTask::new(scene, document, warnings, self.resolver.clone(), self.settings)
    }

    /// Make a finished load the active scene, reconcile the stash and save.
    ///
    /// Album entries the task did not reach are kept as they are. With a scene
    /// already active only the loaded scene is taken from the task, so other
    /// scenes keep what was saved while the task ran.
    pub fn finish_load(&mut self, task: LoadTask) -> LoadOutcome {
        let parts = task.into_parts();
        let mut warnings = parts.warnings;

        for warning in warnings.iter().filter(|warning| !warning.is_entry_level()) {
            error!(scene = %parts.scene, %warning, "album document problem during load");
        }
        info!(
            scene = %parts.scene,
            pictures = parts.records.len(),
            dropped = warnings.iter().filter(|warning| warning.is_entry_level()).count(),
            "scene loaded"
        );
        let unreadable = warnings
            .iter()
            .any(|warning| matches!(warning, AlbumError::DocumentUnreadable { .. }));
        if self.active.is_some() && !unreadable {
            // saves made since `begin_load` live only in our copy
            self.document.set_scene(&parts.scene, &parts.collection);
        } else {
            self.document = parts.document;
        }
        self.active = Some(ActiveScene {
            name: parts.scene,
            collection: parts.collection,
        });
        self.spawned.clear();

        if let Err(err) = self.reconcile().and_then(|()| self.save()) {
            warnings.push(err);
        }

        LoadOutcome {
            records: parts.records.into_iter().collect(),
            warnings,
        }
    }

    /// Load `scene` in one go
    pub fn load<I, B>(&mut self, scene: &str, images: &mut I, builder: &mut B) -> LoadOutcome
    where
        I: ImageSource + ?Sized,
        B: VisualBuilder + ?Sized,
    {
        let mut task = self.begin_load(scene);
        task.run(images, builder);
        self.finish_load(task)
    }

    /// Destroy every live picture and forget the active scene
    pub fn unload_scene<B: VisualBuilder + ?Sized>(&mut self, pictures: &mut Pictures, builder: &mut B) {
        for mut record in pictures.drain() {
            dematerialize(&mut record, builder);
        }
        if let Some(active) = self.active.take() {
            info!(scene = %active.name, "scene unloaded");
        }
        self.spawned.clear();
    }

    // ---- Persistence ----

    /// Rescan the pictures folder and rebuild the stash of the active scene, then save
    pub fn reconcile_stash(&mut self) -> AlbumResult<()> {
        self.reconcile()?;
        self.save()
    }

    /// Recompute the stash: existing entries first (minus missing files and
    /// files in use), then unused files from the pictures folder in name order
    fn reconcile(&mut self) -> AlbumResult<()> {
        let active = self.active.as_mut().ok_or(AlbumError::NoActiveScene)?;
        let resolver = &self.resolver;

        let mut used: HashSet<PathBuf> = active
            .collection
            .album
            .iter()
            .filter_map(entry_path)
            .filter_map(|path| resolver.resolve(path))
            .collect();
        used.extend(self.spawned.iter().cloned());

        let mut stash = Vec::with_capacity(active.collection.stash.len());
        for stored in active.collection.stash.drain(..) {
            match resolver.resolve(&stored) {
                None => debug!(path = %stored, "removed missing file from stash"),
                Some(resolved) => {
                    if used.insert(resolved) {
                        stash.push(stored);
                    } else {
                        debug!(path = %stored, "removed picture in use from stash");
                    }
                }
            }
        }

        for file in list_pictures(resolver.pictures_dir()) {
            let stored = resolver.stored_name(&file);
            let Some(resolved) = resolver.resolve(&stored) else {
                continue;
            };
            if used.insert(resolved) {
                info!(path = %stored, "adding new picture to stash");
                stash.push(stored);
            }
        }

        active.collection.stash = stash;
        Ok(())
    }

    /// Rewrite the whole document
    pub fn save(&mut self) -> AlbumResult<()> {
        let active = self.active.as_ref().ok_or(AlbumError::NoActiveScene)?;
        self.document.set_scene(&active.name, &active.collection);

        match self.document.write(self.paths.document()) {
            Ok(()) => {
                self.write_error = None;
                Ok(())
            }
            Err(err) => {
                error!(%err, "album changes are not saved");
                self.write_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Write a record's pose, size and visibility into its album entry and save.
    ///
    /// Returns `false` (and writes nothing) for records that are not in the album.
    pub fn update_record(&mut self, record: &PictureRecord) -> AlbumResult<bool> {
        let Some(EntryKey(key)) = &record.entry else {
            return Ok(false);
        };
        let default_visible = self.settings.visible;
        let active = self.active.as_mut().ok_or(AlbumError::NoActiveScene)?;
        let entry = active
            .collection
            .find_entry_mut(key)
            .ok_or_else(|| AlbumError::UnknownEntry(key.clone()))?;

        entry.insert("position".into(), vector_json(record.position));
        entry.insert("rotation".into(), vector_json(record.rotation));

        // keep whichever size the user chose to store
        if entry.contains_key("height") {
            entry.insert("height".into(), number_json(record.height));
            if entry.contains_key("width") {
                entry.insert("width".into(), number_json(record.width));
            }
        } else {
            entry.insert("width".into(), number_json(record.width));
        }

        if record.visible != default_visible || entry.contains_key("visible") {
            entry.insert("visible".into(), Value::Bool(record.visible));
        }

        debug!(path = %key, "album entry updated");
        self.save()?;
        Ok(true)
    }

    // ---- Structural actions ----

    /// Take the first stash entry and bring it to life at `position`/`rotation`.
    ///
    /// The new record is ephemeral until `commit_to_album`.
    pub fn spawn_from_stash<I, B>(
        &mut self,
        pictures: &mut Pictures,
        position: Vector3<f32>,
        rotation: Vector3<f32>,
        images: &mut I,
        builder: &mut B,
    ) -> AlbumResult<RecordId>
    where
        I: ImageSource + ?Sized,
        B: VisualBuilder + ?Sized,
    {
        self.reconcile()?;
        let active = self.active.as_mut().ok_or(AlbumError::NoActiveScene)?;
        if active.collection.stash.is_empty() {
            warn!(scene = %active.name, "no pictures in stash, cannot spawn a new one");
            return Err(AlbumError::StashEmpty(active.name.clone()));
        }

        // reconcile only keeps stash entries that resolve
        let stored = active.collection.stash.remove(0);
        let resolved = self
            .resolver
            .resolve(&stored)
            .ok_or_else(|| AlbumError::MissingFile(stored.clone()))?;

        let mut record = PictureRecord::ephemeral(stored, resolved.clone(), position, rotation, &self.settings);
        if let Err(err) = materialize(&mut record, images, builder, &self.settings) {
            // the path goes back to the stash on the next reconcile
            warn!(path = %record.path, %err, "could not spawn picture");
            return Err(err);
        }

        self.spawned.insert(resolved.clone());
        if let Err(err) = self.save() {
            // nothing reached the disk, put things back as they were
            self.spawned.remove(&resolved);
            if let Some(active) = self.active.as_mut() {
                active.collection.stash.insert(0, record.path.clone());
            }
            dematerialize(&mut record, builder);
            return Err(err);
        }

        info!(path = %record.path, "picture spawned from stash");
        Ok(pictures.push(record))
    }

    /// Bring an arbitrary picture file to life without touching the document
    pub fn import_picture<I, B>(
        &mut self,
        pictures: &mut Pictures,
        file: &Path,
        position: Vector3<f32>,
        rotation: Vector3<f32>,
        images: &mut I,
        builder: &mut B,
    ) -> AlbumResult<RecordId>
    where
        I: ImageSource + ?Sized,
        B: VisualBuilder + ?Sized,
    {
        let stored = self.resolver.stored_name(file);
        let resolved = self
            .resolver
            .resolve(&stored)
            .ok_or_else(|| AlbumError::MissingFile(file.display().to_string()))?;

        let mut record = PictureRecord::ephemeral(stored, resolved.clone(), position, rotation, &self.settings);
        materialize(&mut record, images, builder, &self.settings)?;

        info!(path = %record.path, "picture imported");
        self.spawned.insert(resolved);
        Ok(pictures.push(record))
    }

    /// Import the newest picture in `dir` (e.g. a camera output folder)
    pub fn import_latest_capture<I, B>(
        &mut self,
        pictures: &mut Pictures,
        dir: &Path,
        position: Vector3<f32>,
        rotation: Vector3<f32>,
        images: &mut I,
        builder: &mut B,
    ) -> AlbumResult<RecordId>
    where
        I: ImageSource + ?Sized,
        B: VisualBuilder + ?Sized,
    {
        let capture = latest_capture(dir).ok_or_else(|| AlbumError::MissingFile(dir.display().to_string()))?;
        debug!(path = %capture.path.display(), created = %capture.created, "latest capture");
        self.import_picture(pictures, &capture.path, position, rotation, images, builder)
    }

    /// Add an album entry for an ephemeral record
    pub fn commit_to_album(&mut self, pictures: &mut Pictures, id: RecordId) -> AlbumResult<()> {
        let record = pictures.get_mut(id).ok_or(AlbumError::UnknownRecord(id))?;
        if record.is_persisted() {
            return Ok(());
        }

        let active = self.active.as_mut().ok_or(AlbumError::NoActiveScene)?;
        let resolver = &self.resolver;
        let taken = active
            .collection
            .album
            .iter()
            .filter_map(entry_path)
            .any(|path| resolver.resolve(path).as_ref() == Some(&record.resolved));
        if taken {
            return Err(AlbumError::DuplicateEntry(record.path.clone()));
        }

        let entry = entry_for(record, &self.settings);
        active.collection.album.push(Value::Object(entry.to_json()));
        record.entry = Some(EntryKey(record.path.clone()));
        self.spawned.remove(&record.resolved);
        info!(path = %record.path, "picture added to album");

        self.reconcile()?;
        self.save()
    }

    /// Remove a picture from the scene and put its path back in the stash
    pub fn send_to_stash<B: VisualBuilder + ?Sized>(
        &mut self,
        pictures: &mut Pictures,
        id: RecordId,
        builder: &mut B,
    ) -> AlbumResult<()> {
        let active = self.active.as_mut().ok_or(AlbumError::NoActiveScene)?;
        let mut record = pictures.remove(id).ok_or(AlbumError::UnknownRecord(id))?;
        dematerialize(&mut record, builder);

        if let Some(EntryKey(key)) = &record.entry {
            active.collection.remove_entry(key);
        }
        active.collection.stash.push(record.path.clone());
        self.spawned.remove(&record.resolved);
        info!(path = %record.path, "picture sent to stash");

        self.reconcile()?;
        self.save()
    }

    /// Remove a picture from the scene. The file stays on disk.
    pub fn delete<B: VisualBuilder + ?Sized>(
        &mut self,
        pictures: &mut Pictures,
        id: RecordId,
        builder: &mut B,
    ) -> AlbumResult<()> {
        let active = self.active.as_mut().ok_or(AlbumError::NoActiveScene)?;
        let mut record = pictures.remove(id).ok_or(AlbumError::UnknownRecord(id))?;
        dematerialize(&mut record, builder);

        if let Some(EntryKey(key)) = &record.entry {
            active.collection.remove_entry(key);
        }
        self.spawned.remove(&record.resolved);
        info!(path = %record.path, "picture deleted");

        self.reconcile()?;
        self.save()
    }

    pub fn set_visibility<B: VisualBuilder + ?Sized>(
        &mut self,
        pictures: &mut Pictures,
        id: RecordId,
        visible: bool,
        builder: &mut B,
    ) -> AlbumResult<()> {
        let record = pictures.get_mut(id).ok_or(AlbumError::UnknownRecord(id))?;
        record.visible = visible;
        if let Some(live) = record.live.as_mut() {
            live.node.visible = visible;
            builder.set_visible(live.visual, visible);
        }
        debug!(path = %record.path, visible, "visibility changed");
        self.update_record(record).map(|_| ())
    }

    /// Flip visibility; returns the new value
    pub fn toggle_visibility<B: VisualBuilder + ?Sized>(
        &mut self,
        pictures: &mut Pictures,
        id: RecordId,
        builder: &mut B,
    ) -> AlbumResult<bool> {
        let visible = !pictures.get(id).ok_or(AlbumError::UnknownRecord(id))?.visible;
        self.set_visibility(pictures, id, visible, builder)?;
        Ok(visible)
    }
}

/// Album entry for a new record: placement and width, plus the fields that
/// differ from the current defaults
fn entry_for(record: &PictureRecord, settings: &AlbumSettings) -> AlbumEntry {
    let mut entry = AlbumEntry::placed(record.path.clone(), record.position, record.rotation);
    entry.width = Some(record.width);
    entry.padding = (record.padding != settings.default_padding).then_some(record.padding);
    entry.thickness = (record.thickness != settings.default_thickness).then_some(record.thickness);
    entry.color = (record.color != settings.default_color).then_some(record.color);
    entry.alpha = (record.alpha_blend != settings.alpha_blend).then_some(record.alpha_blend);
    entry.visible = (record.visible != settings.visible).then_some(record.visible);
    entry
}
