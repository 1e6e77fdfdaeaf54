//! Per-frame input snapshot
//!
//! The host samples its devices once per frame and hands the result to the
//! player controller.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Which input path the build reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InputPlatform {
    /// Keyboard axis + mouse
    #[default]
    Desktop,
    /// Tilt + touch + swipe
    Mobile,
}

/// Lateral control source on mobile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HorizMovement {
    #[default]
    Accelerometer,
    ScreenTouch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TouchPhase {
    Began,
    Moved,
    Stationary,
    Ended,
    Canceled,
}

/// A finger on the screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Touch {
    /// Pixel position, origin bottom-left
    pub position: Vec2,
    pub phase: TouchPhase,
}

impl Touch {
    pub fn new(position: Vec2, phase: TouchPhase) -> Self {
        Self { position, phase }
    }
}

/// Input state for a single frame
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    /// Horizontal axis in -1..=1 (keyboard/stick)
    pub horizontal_axis: f32,
    /// Pixel position of the primary mouse button while held
    pub pointer_held: Option<Vec2>,
    /// Device acceleration in g
    pub acceleration: Vec3,
    /// Active touches, first one is primary
    pub touches: Vec<Touch>,
}

impl FrameInput {
    pub fn primary_touch(&self) -> Option<&Touch> {
        self.touches.first()
    }
}
