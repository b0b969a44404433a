/// Spatial building blocks
///
/// - Poses, similarity transforms and Euler conversion (transform.rs)
/// - Oriented boxes and proximity picking (picker.rs)
/// - The live frame/image layout of a picture (frame.rs)

pub mod transform;
pub mod picker;
pub mod frame;

pub use frame::{Anchor, AnchorFrames, FrameDimensions, PictureNode};
pub use picker::{distance_to_surface, pick_nearest, OrientedBox};
pub use transform::{Pose, Transform};
