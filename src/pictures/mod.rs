/// Picture files on disk
///
/// This module handles:
/// - Resolving stored (possibly relative) paths against the pictures folder (paths.rs)
/// - Listing image files and finding the latest capture (scan.rs)
/// - Decoding images and flattening their alpha onto the frame color (loader.rs)

pub mod paths;
pub mod scan;
pub mod loader;

pub use loader::{DiskImages, ImageSource, PixelBuffer};
pub use paths::PathResolver;
pub use scan::{is_picture_file, latest_capture, list_pictures, CaptureFile};
