/// The album document on disk
///
/// One JSON object keyed by scene name. Only the `stash` and `album` arrays of
/// the active scene are ever interpreted; everything else is carried through
/// untouched, in its original key order.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, error, warn};

use crate::error::{AlbumError, AlbumResult};
use crate::state::entry::entry_path;

/// Suffix of the backup written when the document cannot be read
pub const CORRUPT_SUFFIX: &str = "corrupt";

/// The whole album document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlbumDocument {
    root: Map<String, Value>,
}

impl AlbumDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the document at `path`.
    ///
    /// Never fails: a missing file gives an empty document, an unreadable one is
    /// copied aside to `<path>.corrupt` and replaced by an empty document, with a
    /// `DocumentUnreadable` warning.
    pub fn read(path: &Path) -> (Self, Vec<AlbumError>) {
        if !path.exists() {
            warn!(path = %path.display(), "album document not found, starting a new one");
            return (Self::new(), Vec::new());
        }

        let reason = match fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str::<Value>(&text) {
                Ok(Value::Object(root)) => return (Self { root }, Vec::new()),
                Ok(other) => format!("top level is not an object (got {})", json_kind(&other)),
                Err(err) => err.to_string(),
            },
            Err(err) => err.to_string(),
        };

        error!(path = %path.display(), %reason, "album document is unreadable");
        let backup = backup_path(path);
        match fs::copy(path, &backup) {
            Ok(_) => warn!(backup = %backup.display(), "kept a copy of the unreadable document"),
            Err(err) => error!(backup = %backup.display(), %err, "could not back up the unreadable document"),
        }

        let warning = AlbumError::DocumentUnreadable {
            path: path.to_path_buf(),
            reason,
        };
        (Self::new(), vec![warning])
    }

    /// Write the document pretty-printed, through a temp file and a rename
    pub fn write(&self, path: &Path) -> AlbumResult<()> {
        let write_err = |source: std::io::Error| AlbumError::DocumentWrite {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let text = serde_json::to_string_pretty(&Value::Object(self.root.clone()))
            .map_err(|err| write_err(std::io::Error::other(err)))?;

        let tmp = tmp_path(path);
        {
            let mut file = fs::File::create(&tmp).map_err(write_err)?;
            file.write_all(text.as_bytes()).map_err(write_err)?;
            file.write_all(b"\n").map_err(write_err)?;
            file.sync_all().map_err(write_err)?;
        }
        fs::rename(&tmp, path).map_err(write_err)?;

        debug!(path = %path.display(), bytes = text.len(), "album document written");
        Ok(())
    }

    /// The collection stored under `name`, or an empty one.
    ///
    /// The returned warnings describe parts of the scene that had to be ignored.
    pub fn scene(&self, name: &str) -> (SceneCollection, Vec<String>) {
        match self.root.get(name) {
            Some(Value::Object(obj)) => SceneCollection::from_object(obj),
            Some(other) => {
                let note = format!("scene \"{name}\" is not an object (got {}), replacing it", json_kind(other));
                (SceneCollection::default(), vec![note])
            }
            None => (SceneCollection::default(), Vec::new()),
        }
    }

    pub fn set_scene(&mut self, name: &str, scene: &SceneCollection) {
        self.root.insert(name.to_string(), scene.to_value());
    }

    pub fn scene_names(&self) -> impl Iterator<Item = &str> {
        self.root.keys().map(String::as_str)
    }

    pub fn as_value(&self) -> Value {
        Value::Object(self.root.clone())
    }
}

/// `stash` + `album` of one scene, plus whatever else the scene object holds
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneCollection {
    /// Stored paths of pictures not placed in the scene
    pub stash: Vec<String>,
    /// Raw album entries, in order
    pub album: Vec<Value>,
    /// Other keys of the scene object, with placeholders where `stash` and
    /// `album` sat so that writing keeps the key order
    pub extra: Map<String, Value>,
}

impl SceneCollection {
    fn from_object(obj: &Map<String, Value>) -> (Self, Vec<String>) {
        let mut notes = Vec::new();
        let mut scene = Self::default();

        for (key, value) in obj {
            match (key.as_str(), value) {
                ("stash", Value::Array(items)) => {
                    for item in items {
                        match item.as_str() {
                            Some(s) => scene.stash.push(s.to_string()),
                            None => notes.push(format!("ignoring non-string stash item {item}")),
                        }
                    }
                }
                ("album", Value::Array(items)) => scene.album = items.clone(),
                ("stash" | "album", other) => {
                    notes.push(format!("\"{key}\" is not an array (got {}), replacing it", json_kind(other)))
                }
                _ => {
                    scene.extra.insert(key.clone(), value.clone());
                    continue;
                }
            }
            scene.extra.insert(key.clone(), Value::Null);
        }
        (scene, notes)
    }

    /// Scene object in its original key order; a new scene gets `stash` then `album`
    pub fn to_value(&self) -> Value {
        let mut obj = self.extra.clone();
        obj.insert(
            "stash".into(),
            Value::Array(self.stash.iter().cloned().map(Value::String).collect()),
        );
        obj.insert("album".into(), Value::Array(self.album.clone()));
        Value::Object(obj)
    }

    /// The album entry stored under `key`
    pub fn find_entry_mut(&mut self, key: &str) -> Option<&mut Map<String, Value>> {
        self.album
            .iter_mut()
            .filter(|entry| entry_path(entry) == Some(key))
            .find_map(Value::as_object_mut)
    }

    /// Remove the album entry stored under `key`; true if there was one
    pub fn remove_entry(&mut self, key: &str) -> bool {
        match self.album.iter().position(|entry| entry_path(entry) == Some(key)) {
            Some(index) => {
                self.album.remove(index);
                true
            }
            None => false,
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

pub fn backup_path(path: &Path) -> PathBuf {
    with_suffix(path, CORRUPT_SUFFIX)
}

fn tmp_path(path: &Path) -> PathBuf {
    with_suffix(path, "tmp")
}
