/// Per-hand input for one tick

use crate::spatial::{Pose, Transform};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    /// Processing order within a tick
    pub const BOTH: [Hand; 2] = [Hand::Left, Hand::Right];

    pub fn index(self) -> usize {
        match self {
            Hand::Left => 0,
            Hand::Right => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Hand::Left => "left",
            Hand::Right => "right",
        }
    }
}

/// Tracked pose (rig-local) and the two analog values of one controller
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HandInput {
    pub pose: Pose,
    /// 0.0 (released) to 1.0 (fully pressed)
    pub trigger: f32,
    pub grip: f32,
}

impl HandInput {
    pub fn new(pose: Pose, trigger: f32, grip: f32) -> Self {
        Self { pose, trigger, grip }
    }

    /// Either the trigger or the grip is held past `threshold`
    pub fn is_closed(&self, threshold: f32) -> bool {
        self.trigger > threshold || self.grip > threshold
    }
}

/// Both hands plus the rig (player origin) they are tracked in
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandsFrame {
    pub rig: Transform,
    pub left: HandInput,
    pub right: HandInput,
}

impl HandsFrame {
    pub fn new(left: HandInput, right: HandInput) -> Self {
        Self {
            rig: Transform::identity(),
            left,
            right,
        }
    }

    pub fn input(&self, hand: Hand) -> &HandInput {
        match hand {
            Hand::Left => &self.left,
            Hand::Right => &self.right,
        }
    }

    /// World transform of a hand
    pub fn world(&self, hand: Hand) -> Transform {
        self.rig.compose(&Transform::from(self.input(hand).pose))
    }
}

impl Default for HandsFrame {
    fn default() -> Self {
        Self::new(HandInput::default(), HandInput::default())
    }
}
