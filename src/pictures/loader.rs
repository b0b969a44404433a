/// Picture image loader
///
/// Decodes an image file and flattens it to opaque RGB8. When alpha blending is
/// enabled for a picture, transparent pixels are blended over the frame color so
/// the picture looks transparent against its own frame; otherwise alpha is dropped.

use std::path::Path;

use crate::color::FrameColor;
use crate::error::{AlbumError, AlbumResult};

/// Decoded, alpha-free picture pixels
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    /// Row-major RGB8
    pub rgb: Vec<u8>,
}

impl PixelBuffer {
    /// Height over width; above 1.0 for portrait images
    pub fn aspect_ratio(&self) -> f32 {
        if self.width == 0 {
            return 1.0;
        }
        self.height as f32 / self.width as f32
    }
}

/// Image decode service used when materializing pictures
pub trait ImageSource {
    fn load_image(
        &mut self,
        path: &Path,
        background: FrameColor,
        alpha_blend: bool,
    ) -> AlbumResult<PixelBuffer>;
}

/// Loads pictures straight from disk with the `image` crate
#[derive(Debug, Default, Clone, Copy)]
pub struct DiskImages;

impl ImageSource for DiskImages {
    fn load_image(
        &mut self,
        path: &Path,
        background: FrameColor,
        alpha_blend: bool,
    ) -> AlbumResult<PixelBuffer> {
        // Verify file exists
        if !path.is_file() {
            return Err(AlbumError::MissingFile(path.display().to_string()));
        }

        let decoded = image::open(path).map_err(|source| AlbumError::ImageDecode {
            path: path.to_path_buf(),
            source,
        })?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();

        let rgb = if alpha_blend {
            rgba.pixels().flat_map(|p| background.blend_under(p.0)).collect()
        } else {
            rgba.pixels().flat_map(|p| [p.0[0], p.0[1], p.0[2]]).collect()
        };

        tracing::debug!(path = %path.display(), width, height, alpha_blend, "loaded picture");

        Ok(PixelBuffer { width, height, rgb })
    }
}
