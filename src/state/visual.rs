/// Turning records into live pictures
///
/// Rendering is done by the host. The store only needs to hand over the decoded
/// pixels and the frame layout, and get back an opaque handle.

use crate::config::AlbumSettings;
use crate::error::{AlbumError, AlbumResult};
use crate::pictures::{ImageSource, PixelBuffer};
use crate::spatial::{FrameDimensions, PictureNode, Transform};
use crate::state::data::{LiveHandle, PictureRecord, VisualId};

/// Host-side creation of picture visuals
pub trait VisualBuilder {
    /// Create the frame and image objects for `record`, laid out as `node`.
    /// An `Err` carries a human readable reason.
    fn build_visual(
        &mut self,
        record: &PictureRecord,
        node: &PictureNode,
        pixels: &PixelBuffer,
    ) -> Result<VisualId, String>;

    fn destroy_visual(&mut self, visual: VisualId);

    /// Show or hide (and stop colliding with) a visual
    fn set_visible(&mut self, _visual: VisualId, _visible: bool) {}
}

/// Load the image, derive the frame size and ask the host for a visual.
///
/// On success `record.width`/`height` hold the derived size and `record.live` is set.
pub fn materialize<I, B>(
    record: &mut PictureRecord,
    images: &mut I,
    builder: &mut B,
    settings: &AlbumSettings,
) -> AlbumResult<()>
where
    I: ImageSource + ?Sized,
    B: VisualBuilder + ?Sized,
{
    let pixels = images
        .load_image(&record.resolved, record.color, record.alpha_blend)
        .map_err(|err| match err {
            AlbumError::ImageDecode { path, source } => AlbumError::visual_build(path, source.to_string()),
            other => other,
        })?;

    let aspect = pixels.aspect_ratio();
    let border = record.border();
    let dims = FrameDimensions::derive(record.width, record.height, border, aspect, settings.default_size)
        .clamped(settings.max_size, border, aspect);
    record.width = dims.width;
    record.height = dims.height;

    let node = PictureNode::new(
        Transform::from_euler_degrees(record.position, record.rotation),
        dims,
        border,
        record.thickness,
        aspect,
        record.visible,
    );

    let visual = builder
        .build_visual(record, &node, &pixels)
        .map_err(|reason| AlbumError::visual_build(&record.resolved, reason))?;

    record.live = Some(LiveHandle { visual, node });
    Ok(())
}

/// Destroy the visual of a record, if it has one
pub fn dematerialize<B: VisualBuilder + ?Sized>(record: &mut PictureRecord, builder: &mut B) {
    if let Some(live) = record.live.take() {
        builder.destroy_visual(live.visual);
    }
}
