/// Live geometry of a framed picture
///
/// A picture node owns two children laid out in its local space: the frame (a box
/// `width x height x thickness`, sitting behind the origin) and the image quad
/// (`width - border` wide, 1 mm in front of the frame). Sizes are stored in the
/// node's local units so that a scaled parent (the two-hand resize handle) can
/// stretch the picture while the border and depth stay constant in world units.

use cgmath::{Vector2, Vector3};

use crate::interaction::Hand;
use crate::spatial::transform::Transform;

/// Distance between the image and the frame surface (meters)
pub const IMAGE_OFFSET: f32 = 0.001;

/// Smallest image side a resize can shrink a picture to (meters)
pub const MIN_IMAGE_SIZE: f32 = 0.01;

/// What a picture node is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Anchor {
    AlbumRoot,
    Hand(Hand),
    ResizeHandle,
}

/// World transforms of every anchor for the current tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorFrames {
    pub album_root: Transform,
    pub left_hand: Transform,
    pub right_hand: Transform,
    pub resize_handle: Transform,
}

impl AnchorFrames {
    pub fn get(&self, anchor: Anchor) -> Transform {
        match anchor {
            Anchor::AlbumRoot => self.album_root,
            Anchor::Hand(Hand::Left) => self.left_hand,
            Anchor::Hand(Hand::Right) => self.right_hand,
            Anchor::ResizeHandle => self.resize_handle,
        }
    }
}

impl Default for AnchorFrames {
    fn default() -> Self {
        Self {
            album_root: Transform::identity(),
            left_hand: Transform::identity(),
            right_hand: Transform::identity(),
            resize_handle: Transform::identity(),
        }
    }
}

/// Outer frame size in world units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameDimensions {
    pub width: f32,
    pub height: f32,
}

impl FrameDimensions {
    /// Size of a picture from its stored width/height.
    ///
    /// A zero size means "unset": with neither set, the longer side of the image
    /// gets `default_size`. Width drives when set, height is derived otherwise.
    /// `aspect` is image height over width, `border` the padding on both sides.
    pub fn derive(width: f32, height: f32, border: f32, aspect: f32, default_size: f32) -> Self {
        let (mut width, mut height) = (width, height);
        if width == 0.0 && height == 0.0 {
            if aspect > 1.0 {
                height = default_size;
            } else {
                width = default_size;
            }
        }

        if width == 0.0 {
            Self::from_height(height, border, aspect)
        } else {
            Self::from_width(width, border, aspect)
        }
    }

    pub fn from_width(width: f32, border: f32, aspect: f32) -> Self {
        Self {
            width,
            height: (width - border) * aspect + border,
        }
    }

    pub fn from_height(height: f32, border: f32, aspect: f32) -> Self {
        Self {
            width: (height - border) / aspect + border,
            height,
        }
    }

    /// Grow (keeping the aspect ratio) until the image is at least
    /// `MIN_IMAGE_SIZE` wide and tall, then shrink until neither side exceeds
    /// `max_size`. The maximum wins for extreme aspect ratios.
    pub fn clamped(self, max_size: f32, border: f32, aspect: f32) -> Self {
        let mut dims = self;
        if dims.width - border < MIN_IMAGE_SIZE {
            dims = Self::from_width(border + MIN_IMAGE_SIZE, border, aspect);
        }
        if dims.height - border < MIN_IMAGE_SIZE {
            dims = Self::from_height(border + MIN_IMAGE_SIZE, border, aspect);
        }
        if dims.width > max_size {
            dims = Self::from_width(max_size, border, aspect);
        }
        if dims.height > max_size {
            dims = Self::from_height(max_size, border, aspect);
        }
        dims
    }
}

/// Spatial state of one materialized picture
#[derive(Debug, Clone, PartialEq)]
pub struct PictureNode {
    /// Transform relative to `anchor`
    pub local: Transform,
    pub anchor: Anchor,
    /// Frame box size in node-local units
    pub frame_scale: Vector3<f32>,
    /// Frame center depth in node-local units
    pub frame_offset: f32,
    /// Image quad size in node-local units
    pub image_scale: Vector2<f32>,
    /// Image quad depth in node-local units (negative: in front)
    pub image_offset: f32,
    /// Image height over width
    pub aspect_ratio: f32,
    /// Total padding across the picture (both sides), world units
    pub border: f32,
    /// Frame depth, world units
    pub thickness: f32,
    pub visible: bool,
}

impl PictureNode {
    /// Lay out a picture at `placement` under the album root
    pub fn new(
        placement: Transform,
        dims: FrameDimensions,
        border: f32,
        thickness: f32,
        aspect_ratio: f32,
        visible: bool,
    ) -> Self {
        let mut node = Self {
            local: placement,
            anchor: Anchor::AlbumRoot,
            frame_scale: Vector3::new(0.0, 0.0, 0.0),
            frame_offset: 0.0,
            image_scale: Vector2::new(0.0, 0.0),
            image_offset: 0.0,
            aspect_ratio,
            border,
            thickness,
            visible,
        };
        node.layout(dims, placement.scale);
        node
    }

    pub fn world(&self, anchors: &AnchorFrames) -> Transform {
        anchors.get(self.anchor).compose(&self.local)
    }

    /// Move the node under another anchor without moving it in the world
    pub fn reparent(&mut self, anchor: Anchor, anchors: &AnchorFrames) {
        if anchor == self.anchor {
            return;
        }
        let world = self.world(anchors);
        self.local = Transform::relative_to(&world, &anchors.get(anchor));
        self.anchor = anchor;
    }

    /// World-space center of the frame box
    pub fn frame_center(&self, anchors: &AnchorFrames) -> Vector3<f32> {
        self.world(anchors)
            .transform_point(Vector3::new(0.0, 0.0, self.frame_offset))
    }

    /// Current outer size in world units
    pub fn world_size(&self, anchors: &AnchorFrames) -> FrameDimensions {
        let scale = self.world(anchors).scale;
        FrameDimensions {
            width: self.frame_scale.x * scale,
            height: self.frame_scale.y * scale,
        }
    }

    /// Re-derive the picture size from the frame's width under the current scale.
    ///
    /// Width is the free variable: it follows the frame's local width times the
    /// world scale. Height follows the image aspect ratio. Border, depth and the
    /// image offset are kept constant in world units.
    pub fn apply_scale(&mut self, anchors: &AnchorFrames, max_size: f32) -> FrameDimensions {
        let scale = self.world(anchors).scale;
        let requested = self.frame_scale.x * scale;
        let dims = FrameDimensions::from_width(requested, self.border, self.aspect_ratio)
            .clamped(max_size, self.border, self.aspect_ratio);
        self.layout(dims, scale);
        dims
    }

    fn layout(&mut self, dims: FrameDimensions, scale: f32) {
        self.frame_scale = Vector3::new(
            dims.width / scale,
            dims.height / scale,
            self.thickness / scale,
        );
        self.frame_offset = self.thickness / (2.0 * scale);
        self.image_scale = Vector2::new(
            (dims.width - self.border) / scale,
            (dims.height - self.border) / scale,
        );
        self.image_offset = -IMAGE_OFFSET / scale;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, One, Quaternion};

    const BORDER: f32 = 0.02;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_portrait_gets_default_height() {
        let dims = FrameDimensions::derive(0.0, 0.0, BORDER, 2.0, 0.5);
        assert!(close(dims.height, 0.5));
        assert!(close(dims.width, (0.5 - BORDER) / 2.0 + BORDER));
    }

    #[test]
    fn test_landscape_gets_default_width() {
        let dims = FrameDimensions::derive(0.0, 0.0, BORDER, 0.5, 0.5);
        assert!(close(dims.width, 0.5));
        assert!(close(dims.height, (0.5 - BORDER) * 0.5 + BORDER));
    }

    #[test]
    fn test_width_drives_when_both_set() {
        let dims = FrameDimensions::derive(1.0, 3.0, BORDER, 1.0, 0.5);
        assert!(close(dims.width, 1.0));
        assert!(close(dims.height, 1.0));

        let dims = FrameDimensions::derive(0.0, 0.8, BORDER, 1.0, 0.5);
        assert!(close(dims.width, 0.8));
    }

    #[test]
    fn test_clamp_keeps_aspect() {
        let dims = FrameDimensions::from_width(20.0, BORDER, 2.0).clamped(10.0, BORDER, 2.0);
        assert!(close(dims.height, 10.0));
        assert!(dims.width <= 10.0);
        assert!(close((dims.height - BORDER) / (dims.width - BORDER), 2.0));

        let tiny = FrameDimensions::from_width(0.0, BORDER, 1.0).clamped(10.0, BORDER, 1.0);
        assert!(close(tiny.width - BORDER, MIN_IMAGE_SIZE));
    }

    #[test]
    fn test_extreme_aspect_never_exceeds_max_size() {
        // growing the short side to the minimum would make the long side 20 m
        let tall = FrameDimensions::derive(0.0, 0.0, BORDER, 2000.0, 0.5).clamped(10.0, BORDER, 2000.0);
        assert!(close(tall.height, 10.0), "{tall:?}");
        assert!(tall.width <= 10.0);

        let wide = FrameDimensions::derive(0.0, 0.0, BORDER, 1.0 / 2000.0, 0.5).clamped(10.0, BORDER, 1.0 / 2000.0);
        assert!(close(wide.width, 10.0), "{wide:?}");
        assert!(wide.height <= 10.0);
    }

    #[test]
    fn test_reparent_keeps_world_pose() {
        let dims = FrameDimensions::derive(0.0, 0.0, BORDER, 1.0, 0.5);
        let mut node = PictureNode::new(
            Transform::new(Vector3::new(1.0, 1.0, 1.0), Quaternion::one(), 1.0),
            dims,
            BORDER,
            0.01,
            1.0,
            true,
        );

        let mut anchors = AnchorFrames::default();
        anchors.right_hand = Transform::new(Vector3::new(0.5, 1.0, 0.0), Quaternion::one(), 1.0);
        let before = node.world(&anchors);

        node.reparent(Anchor::Hand(Hand::Right), &anchors);
        assert_eq!(node.anchor, Anchor::Hand(Hand::Right));
        assert!((node.world(&anchors).position - before.position).magnitude() < 1e-6);

        // moving the hand now drags the picture along
        anchors.right_hand.position += Vector3::new(0.0, 0.0, 1.0);
        assert!((node.world(&anchors).position - Vector3::new(1.0, 1.0, 2.0)).magnitude() < 1e-6);
    }

    #[test]
    fn test_scale_keeps_border_constant_in_world_units() {
        let dims = FrameDimensions::from_width(0.5, BORDER, 1.0);
        let mut node = PictureNode::new(Transform::identity(), dims, BORDER, 0.01, 1.0, true);

        let mut anchors = AnchorFrames::default();
        node.reparent(Anchor::ResizeHandle, &anchors);

        // the handle doubles in size
        anchors.resize_handle.scale = 2.0;
        let dims = node.apply_scale(&anchors, 10.0);
        assert!(close(dims.width, 1.0));
        assert!(close(dims.height, 1.0));

        let scale = node.world(&anchors).scale;
        assert!(close(node.image_scale.x * scale, 1.0 - BORDER));
        assert!(close(node.frame_scale.z * scale, 0.01));
        assert!(close(node.image_offset * scale, -IMAGE_OFFSET));
        assert_eq!(node.world_size(&anchors), dims);
    }
}
