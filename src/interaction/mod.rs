/// Hand interaction
///
/// This module handles:
/// - Per-hand input and the tracking rig (hands.rs)
/// - Grabbing, carrying and releasing pictures on the fixed tick (grab.rs)
/// - Two-handed resizing on the frame tick (resize.rs)

pub mod hands;
pub mod grab;
pub mod resize;

pub use grab::{HoldState, InteractionContext, TickOutcome};
pub use hands::{Hand, HandInput, HandsFrame};
pub use resize::{handle_transform, ResizeBasis, ResizeHandle};
