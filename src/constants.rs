//! Application-wide constants
//!
//! Default geometry values, persisted key names and file locations live here
//! so the store, the reconciler and the binary agree on them.

/// Geometry used when a stored entry lacks a field
pub mod defaults {
    /// Left edge when `"x"` is missing
    pub const X: i32 = 0;

    /// Top edge when `"y"` is missing
    pub const Y: i32 = 0;

    /// Width when `"w"` is missing
    pub const WIDTH: i32 = 500;

    /// Height when `"h"` is missing
    pub const HEIGHT: i32 = 500;

    /// Maximized flag when `"max"` is missing
    pub const MAXIMIZED: bool = false;
}

/// Key names inside one persisted window entry
pub mod keys {
    pub const X: &str = "x";
    pub const Y: &str = "y";
    pub const WIDTH: &str = "w";
    pub const HEIGHT: &str = "h";
    pub const MAXIMIZED: &str = "max";
}

/// Store location constants
pub mod config {
    /// Directory under the user's config dir when no app name is given
    pub const APP_DIR: &str = "window-restorer";

    /// File name of the geometry document
    pub const FILENAME: &str = "window-geometry.json";

    /// Extension used for the write-then-rename scratch file
    pub const TEMP_EXTENSION: &str = "json.tmp";
}

/// X11 protocol constants
pub mod x11 {
    /// `_NET_WM_STATE` client message action: remove property
    pub const NET_WM_STATE_REMOVE: u32 = 0;

    /// `_NET_WM_STATE` client message action: add property
    pub const NET_WM_STATE_ADD: u32 = 1;

    /// Source indication for EWMH client messages (2 = pager/direct user action)
    pub const SOURCE_INDICATION_PAGER: u32 = 2;
}
