/// Typed view of one album entry
///
/// Album entries arrive as free-form JSON objects that users are allowed to edit
/// by hand. `AlbumEntry::parse` validates an entry once; nothing past this point
/// inspects raw JSON for picture fields. The raw object itself is kept by the
/// store so unknown fields survive rewrites.

use cgmath::Vector3;
use serde_json::{Map, Number, Value};

use crate::color::FrameColor;
use crate::error::{AlbumError, AlbumResult};

/// Fields of an album entry. `None` means "not present, use the default".
#[derive(Debug, Clone, PartialEq)]
pub struct AlbumEntry {
    /// Absolute, or relative to the pictures folder
    pub path: String,
    pub position: Vector3<f32>,
    /// Euler angles in degrees
    pub rotation: Vector3<f32>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub padding: Option<f32>,
    pub thickness: Option<f32>,
    pub color: Option<FrameColor>,
    /// Blend transparent pixels onto the frame color
    pub alpha: Option<bool>,
    pub visible: Option<bool>,
}

impl AlbumEntry {
    /// Validate a raw album entry
    pub fn parse(value: &Value) -> AlbumResult<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| AlbumError::malformed(format!("expected an object, got {value}")))?;

        let path = match obj.get("path") {
            Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
            Some(other) => {
                return Err(AlbumError::malformed(format!(
                    "field \"path\" must be a non-empty string (got {other})"
                )))
            }
            None => return Err(AlbumError::malformed("missing field \"path\"")),
        };

        Ok(Self {
            position: parse_vector(obj, "position")?,
            rotation: parse_vector(obj, "rotation")?,
            width: optional_number(obj, "width")?,
            height: optional_number(obj, "height")?,
            padding: optional_number(obj, "padding")?,
            thickness: optional_number(obj, "thickness")?,
            color: obj.get("color").map(FrameColor::from_json).transpose()?,
            alpha: optional_bool(obj, "alpha")?,
            visible: optional_bool(obj, "visible")?,
            path,
        })
    }

    /// A fresh entry for a picture placed at runtime
    pub fn placed(path: impl Into<String>, position: Vector3<f32>, rotation: Vector3<f32>) -> Self {
        Self {
            path: path.into(),
            position,
            rotation,
            width: None,
            height: None,
            padding: None,
            thickness: None,
            color: None,
            alpha: None,
            visible: None,
        }
    }

    /// JSON object holding only the fields that are set
    pub fn to_json(&self) -> Map<String, Value> {
        let mut obj = Map::new();
        obj.insert("path".into(), Value::String(self.path.clone()));
        obj.insert("position".into(), vector_json(self.position));
        obj.insert("rotation".into(), vector_json(self.rotation));

        let numbers = [
            ("width", self.width),
            ("height", self.height),
            ("padding", self.padding),
            ("thickness", self.thickness),
        ];
        for (key, value) in numbers {
            if let Some(v) = value {
                obj.insert(key.into(), number_json(v));
            }
        }
        if let Some(color) = self.color {
            obj.insert("color".into(), Value::String(color.to_hex()));
        }
        if let Some(alpha) = self.alpha {
            obj.insert("alpha".into(), Value::Bool(alpha));
        }
        if let Some(visible) = self.visible {
            obj.insert("visible".into(), Value::Bool(visible));
        }
        obj
    }
}

/// Stored path of a raw entry, if it has one
pub fn entry_path(value: &Value) -> Option<&str> {
    value.get("path").and_then(Value::as_str)
}

fn parse_vector(obj: &Map<String, Value>, field: &'static str) -> AlbumResult<Vector3<f32>> {
    let malformed = |found: String| AlbumError::MalformedVector { field, found };

    let items = match obj.get(field) {
        Some(Value::Array(items)) => items,
        Some(other) => return Err(malformed(other.to_string())),
        None => return Err(malformed("nothing".to_string())),
    };
    if items.len() != 3 {
        return Err(malformed(Value::Array(items.clone()).to_string()));
    }

    let mut v = [0.0f32; 3];
    for (slot, item) in v.iter_mut().zip(items) {
        *slot = item
            .as_f64()
            .ok_or_else(|| malformed(Value::Array(items.clone()).to_string()))? as f32;
    }
    Ok(Vector3::new(v[0], v[1], v[2]))
}

fn optional_number(obj: &Map<String, Value>, field: &str) -> AlbumResult<Option<f32>> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value.as_f64().map(|n| Some(n as f32)).ok_or_else(|| {
            AlbumError::malformed(format!("field \"{field}\" must be a number (got {value})"))
        }),
    }
}

fn optional_bool(obj: &Map<String, Value>, field: &str) -> AlbumResult<Option<bool>> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(value) => Err(AlbumError::malformed(format!(
            "field \"{field}\" must be true or false (got {value})"
        ))),
    }
}

/// Floats are written with 6 decimals so f32 noise does not leak into the file
pub fn number_json(v: f32) -> Value {
    let rounded = ((v as f64) * 1e6).round() / 1e6;
    Number::from_f64(rounded).map(Value::Number).unwrap_or(Value::Null)
}

pub fn vector_json(v: Vector3<f32>) -> Value {
    Value::Array(vec![number_json(v.x), number_json(v.y), number_json(v.z)])
}
