//! Framed pictures in a persistent virtual space.
//!
//! The crate has two halves:
//! - [`state::AlbumStore`] keeps the album document (placed pictures and the
//!   stash of unplaced ones) consistent with the image files on disk.
//! - [`interaction::InteractionContext`] turns per-hand grip values and poses
//!   into grabbing, carrying and two-handed resizing of one picture at a time.
//!
//! Rendering stays with the host, behind [`state::VisualBuilder`].

pub mod color;
pub mod config;
pub mod error;
pub mod interaction;
pub mod pictures;
pub mod spatial;
pub mod state;

pub use color::FrameColor;
pub use config::{AlbumPaths, AlbumSettings};
pub use error::{AlbumError, AlbumResult};
pub use interaction::{Hand, HandInput, HandsFrame, HoldState, InteractionContext, TickOutcome};
pub use pictures::{DiskImages, ImageSource, PixelBuffer};
pub use state::{AlbumStore, LoadOutcome, LoadStep, LoadTask, PictureRecord, Pictures, RecordId, VisualBuilder, VisualId};
