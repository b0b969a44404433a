/// Frame color handling
///
/// Colors are stored in the album document either as a float array
/// (`[r, g, b]` / `[r, g, b, a]`, components in 0..=1) or as an HTML hex string
/// (`#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`). Internally everything is linear floats.

use serde_json::Value;

use crate::error::{AlbumError, AlbumResult};

/// RGBA color with float components in 0..=1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl FrameColor {
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse an HTML hex color. The leading `#` is mandatory.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.trim().strip_prefix('#')?;
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }

        // Short forms repeat each nibble (#abc == #aabbcc)
        let channel = |s: &str| -> Option<f32> {
            let value = u8::from_str_radix(s, 16).ok()?;
            Some(value as f32 / 255.0)
        };
        let short = |c: char| -> Option<f32> {
            let nibble = c.to_digit(16)? as u8;
            Some((nibble * 17) as f32 / 255.0)
        };

        let chars: Vec<char> = digits.chars().collect();
        match chars.len() {
            3 | 4 => {
                let r = short(chars[0])?;
                let g = short(chars[1])?;
                let b = short(chars[2])?;
                let a = if chars.len() == 4 { short(chars[3])? } else { 1.0 };
                Some(Self::rgba(r, g, b, a))
            }
            6 | 8 => {
                let r = channel(&digits[0..2])?;
                let g = channel(&digits[2..4])?;
                let b = channel(&digits[4..6])?;
                let a = if digits.len() == 8 {
                    channel(&digits[6..8])?
                } else {
                    1.0
                };
                Some(Self::rgba(r, g, b, a))
            }
            _ => None,
        }
    }

    /// Format as `#RRGGBB`, or `#RRGGBBAA` when not fully opaque
    pub fn to_hex(&self) -> String {
        let byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        if byte(self.a) == 255 {
            format!("#{:02X}{:02X}{:02X}", byte(self.r), byte(self.g), byte(self.b))
        } else {
            format!(
                "#{:02X}{:02X}{:02X}{:02X}",
                byte(self.r),
                byte(self.g),
                byte(self.b),
                byte(self.a)
            )
        }
    }

    /// Parse the `color` field of an album entry
    pub fn from_json(value: &Value) -> AlbumResult<Self> {
        match value {
            Value::Array(items) if items.len() >= 3 => {
                let mut c = [0.0f32, 0.0, 0.0, 1.0];
                for (slot, item) in c.iter_mut().zip(items.iter()) {
                    *slot = item
                        .as_f64()
                        .ok_or_else(|| AlbumError::MalformedColor(value.to_string()))?
                        as f32;
                }
                Ok(Self::rgba(c[0], c[1], c[2], c[3]))
            }
            Value::String(hex) => {
                Self::from_hex(hex).ok_or_else(|| AlbumError::MalformedColor(value.to_string()))
            }
            _ => Err(AlbumError::MalformedColor(value.to_string())),
        }
    }

    /// Blend a straight-alpha RGBA8 pixel over this color, returning an opaque RGB8 pixel
    pub fn blend_under(&self, pixel: [u8; 4]) -> [u8; 3] {
        let a = pixel[3] as f32 / 255.0;
        let mix = |src: u8, bg: f32| {
            let src = src as f32 / 255.0;
            ((src * a + bg * (1.0 - a)).clamp(0.0, 1.0) * 255.0).round() as u8
        };
        [mix(pixel[0], self.r), mix(pixel[1], self.g), mix(pixel[2], self.b)]
    }
}

impl Default for FrameColor {
    /// Teal frame, `#7ACCC2`
    fn default() -> Self {
        Self::rgb(122.0 / 255.0, 204.0 / 255.0, 194.0 / 255.0)
    }
}

impl serde::Serialize for FrameColor {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> serde::Deserialize<'de> for FrameColor {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        FrameColor::from_json(&value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn close(a: f32, b: f32, tol: f32) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn test_hex_matches_float_array() {
        let hex = FrameColor::from_json(&json!("#7ACCC2")).unwrap();
        let arr = FrameColor::from_json(&json!([0.478, 0.800, 0.761])).unwrap();

        assert!(close(hex.r, arr.r, 1e-2));
        assert!(close(hex.g, arr.g, 1e-2));
        assert!(close(hex.b, arr.b, 1e-2));
        assert_eq!(arr.a, 1.0);
        assert_eq!(hex.a, 1.0);
    }

    #[test]
    fn test_array_alpha_component() {
        let c = FrameColor::from_json(&json!([1, 0, 0, 0.25])).unwrap();
        assert_eq!(c, FrameColor::rgba(1.0, 0.0, 0.0, 0.25));
    }

    #[test]
    fn test_short_hex_forms() {
        let c = FrameColor::from_hex("#fff").unwrap();
        assert_eq!(c, FrameColor::rgb(1.0, 1.0, 1.0));

        let c = FrameColor::from_hex("#0008").unwrap();
        assert!(close(c.a, 136.0 / 255.0, 1e-6));
    }

    #[test]
    fn test_rejects_bad_colors() {
        for bad in [
            json!([1, 0]),
            json!("7accc2"),
            json!("#7accc"),
            json!("#gggggg"),
            json!(12),
            json!(["r", "g", "b"]),
        ] {
            let err = FrameColor::from_json(&bad).unwrap_err();
            assert!(matches!(err, AlbumError::MalformedColor(_)), "{bad}");
        }
    }

    #[test]
    fn test_hex_round_trip_of_default() {
        assert_eq!(FrameColor::default().to_hex(), "#7ACCC2");
        assert_eq!(FrameColor::rgba(0.0, 0.0, 0.0, 0.5).to_hex(), "#00000080");
    }

    #[test]
    fn test_blend_under() {
        let bg = FrameColor::rgb(1.0, 0.0, 0.0);
        // fully transparent pixel shows the background
        assert_eq!(bg.blend_under([0, 255, 0, 0]), [255, 0, 0]);
        // fully opaque pixel is untouched
        assert_eq!(bg.blend_under([0, 255, 0, 255]), [0, 255, 0]);
        // half way
        assert_eq!(bg.blend_under([0, 0, 0, 128]), [127, 0, 0]);
    }
}
