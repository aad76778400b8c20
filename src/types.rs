//! Value types shared by the store, the reconciler and the X11 backend

use serde::{Deserialize, Serialize};

use crate::constants::defaults;

/// Saved geometry of one window slot
///
/// Field names on disk are `x`, `y`, `w`, `h` and `max`. Every field falls
/// back to its own default when missing, so a partially written entry still
/// reads as a complete record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeometryRecord {
    #[serde(default = "default_x")]
    pub x: i32,
    #[serde(default = "default_y")]
    pub y: i32,
    #[serde(rename = "w", default = "default_width")]
    pub width: i32,
    #[serde(rename = "h", default = "default_height")]
    pub height: i32,
    #[serde(rename = "max", default = "default_maximized")]
    pub maximized: bool,
}

fn default_x() -> i32 {
    defaults::X
}

fn default_y() -> i32 {
    defaults::Y
}

fn default_width() -> i32 {
    defaults::WIDTH
}

fn default_height() -> i32 {
    defaults::HEIGHT
}

fn default_maximized() -> bool {
    defaults::MAXIMIZED
}

impl GeometryRecord {
    pub fn new(x: i32, y: i32, width: i32, height: i32, maximized: bool) -> Self {
        Self {
            x,
            y,
            width,
            height,
            maximized,
        }
    }

    pub fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    pub fn size(&self) -> (i32, i32) {
        (self.width, self.height)
    }
}

impl Default for GeometryRecord {
    fn default() -> Self {
        Self {
            x: defaults::X,
            y: defaults::Y,
            width: defaults::WIDTH,
            height: defaults::HEIGHT,
            maximized: defaults::MAXIMIZED,
        }
    }
}

/// Bounds of one attached screen in root-window pixels
///
/// `x` and `y` are informational: they carry the origin RandR reports, but the
/// clamp only looks at `width` and `height` and always keeps windows within
/// `0..width` and `0..height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenBounds {
    /// Left edge as reported by the display server (not used by the clamp)
    pub x: i32,
    /// Top edge as reported by the display server (not used by the clamp)
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl ScreenBounds {
    /// Screen anchored at the origin
    pub fn sized(width: i32, height: i32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }
}
