//! # Cameras
//!
//! The bounds-based activation flags test entity positions against every
//! active camera. Only the position and half-extent matter to the core.

use crate::math::Vector2;
use serde::{Deserialize, Serialize};

/// Maximum number of cameras tested by the scheduler.
pub const CAMERA_COUNT: usize = 4;

/// Maximum number of screens drawn per frame.
pub const SCREEN_COUNT: usize = 4;

/// Default screen size in pixels.
pub const SCREEN_XSIZE: i32 = 424;
/// Default screen height in pixels.
pub const SCREEN_YSIZE: i32 = 240;

/// A camera the scheduler measures bounds against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Camera {
    /// Centre of the view (fixed-point).
    pub position: Vector2,
    /// Half-extent of the view, added to an entity's update range (fixed-point).
    pub offset: Vector2,
}

impl Camera {
    /// Creates a camera centred on `position` covering a default-sized screen.
    #[must_use]
    pub const fn centred(position: Vector2) -> Self {
        Self {
            position,
            offset: Vector2::from_pixels(SCREEN_XSIZE / 2, SCREEN_YSIZE / 2),
        }
    }
}
