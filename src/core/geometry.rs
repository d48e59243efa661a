//! Window identity and screen geometry
//!
//! All coordinates are screen pixels with a top-left origin. A [`WindowHandle`]
//! is a snapshot: its bounds are only valid until the window moves or is
//! resized, and nothing here tracks that.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Identifier of a window on the display server. Native Wayland toplevels
/// are not enumerable, so every window is reached through X11 or XWayland.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum PlatformWindowId {
    /// X11 window ID
    X11(u32),
}

/// Absolute bounding box of a window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl Bounds {
    pub fn new(left: i32, top: i32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// A window only counts as resolved once it has a non-empty area
    pub fn is_resolved(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Whether a window-relative point lands inside these bounds (edges inclusive)
    pub fn contains(&self, point: RelativePoint) -> bool {
        point.rel_x <= self.width && point.rel_y <= self.height
    }

    /// Translate a window-relative point into absolute screen coordinates
    pub fn to_absolute(&self, point: RelativePoint) -> (i32, i32) {
        (
            self.left.saturating_add_unsigned(point.rel_x),
            self.top.saturating_add_unsigned(point.rel_y),
        )
    }
}

/// Pixel offset measured from a window's top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelativePoint {
    pub rel_x: u32,
    pub rel_y: u32,
}

impl RelativePoint {
    pub fn new(rel_x: u32, rel_y: u32) -> Self {
        Self { rel_x, rel_y }
    }

    /// Build a point from fractions of the window size, e.g. `(0.5, 0.33)` for
    /// "centered, a third of the way down". Fractions outside `[0, 1]` are rejected.
    pub fn fraction(bounds: &Bounds, fx: f64, fy: f64) -> Result<Self> {
        for (axis, value) in [("x", fx), ("y", fy)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidStep(format!(
                    "{axis} fraction {value} is outside 0..=1"
                )));
            }
        }

        Ok(Self {
            rel_x: (bounds.width as f64 * fx).floor() as u32,
            rel_y: (bounds.height as f64 * fy).floor() as u32,
        })
    }
}

/// A located window
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowHandle {
    /// Platform-specific window identifier
    pub platform_id: PlatformWindowId,
    /// Window title as reported by the window manager
    pub title: String,
    /// Geometry at the time of lookup
    pub bounds: Bounds,
}
