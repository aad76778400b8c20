//! Restore and capture of window geometry
//!
//! [`GeometryReconciler`] sits between a [`GeometryStore`] and the live window
//! and screen collaborators. Stored geometry is clamped to the current screen
//! before it is applied, and live geometry is clamped before it is stored, so a
//! window saved on a since-removed part of the desktop does not come back
//! off-screen.

use std::rc::Rc;
use tracing::{error, info};

use crate::persistence::{GeometryStore, StoreResult};
use crate::types::{GeometryRecord, ScreenBounds};

/// One-shot callback run when a window is disposed
///
/// Receives the window so the handler can read its final geometry.
pub type CloseHandler = Box<dyn FnOnce(&dyn WindowHandle)>;

/// Toolkit window as seen by the reconciler
pub trait WindowHandle {
    fn position(&self) -> (i32, i32);
    fn size(&self) -> (i32, i32);
    fn is_maximized(&self) -> bool;

    fn set_position(&self, x: i32, y: i32);
    fn set_size(&self, width: i32, height: i32);
    fn set_maximized(&self, maximized: bool);

    /// Push pending geometry changes to the window system
    fn relayout(&self);

    /// Register `handler` to run exactly once when the window is disposed
    fn on_close(&self, handler: CloseHandler);
}

/// Source of the currently attached screens
pub trait ScreenEnumerator {
    fn list_screens(&self) -> Vec<ScreenBounds>;
}

/// Current geometry of `window` as a record
pub fn record_from_window(window: &dyn WindowHandle) -> GeometryRecord {
    let (x, y) = window.position();
    let (width, height) = window.size();
    GeometryRecord::new(x, y, width, height, window.is_maximized())
}

/// Keep `record` on screen when exactly one screen is attached
///
/// With several screens the record is returned unchanged.
pub fn clamp_to_screens(record: GeometryRecord, screens: &[ScreenBounds]) -> GeometryRecord {
    match screens {
        [screen] => clamp_to_screen(record, screen),
        _ => record,
    }
}

/// Move `record` so it fits inside `screen`
///
/// Negative coordinates are raised to zero first, then an overflowing window
/// is pulled back so its far edge meets the screen edge. A window larger than
/// the screen ends up with a negative coordinate; that case is left alone.
pub fn clamp_to_screen(record: GeometryRecord, screen: &ScreenBounds) -> GeometryRecord {
    let mut clamped = record;

    clamped.x = clamped.x.max(0);
    clamped.y = clamped.y.max(0);

    if clamped.y.saturating_add(record.height) > screen.height {
        clamped.y = screen.height.saturating_sub(record.height);
    }
    if clamped.x.saturating_add(record.width) > screen.width {
        clamped.x = screen.width.saturating_sub(record.width);
    }

    clamped
}

/// Applies stored geometry to windows and stores it back on close
///
/// Holds no state between calls; every operation asks the store afresh.
#[derive(Clone)]
pub struct GeometryReconciler {
    store: Rc<dyn GeometryStore>,
    screens: Rc<dyn ScreenEnumerator>,
}

impl GeometryReconciler {
    pub fn new(store: Rc<dyn GeometryStore>, screens: Rc<dyn ScreenEnumerator>) -> Self {
        Self { store, screens }
    }

    /// Clamp `record` against the screens attached right now
    pub fn clamp(&self, record: GeometryRecord) -> GeometryRecord {
        clamp_to_screens(record, &self.screens.list_screens())
    }

    /// Apply the geometry stored under `code` to `window`
    ///
    /// Returns `false` and leaves the window untouched when nothing is stored
    /// or the store fails.
    pub fn restore(&self, window: &dyn WindowHandle, code: &str) -> bool {
        let record = match self.store.get(code) {
            Ok(Some(record)) => record,
            Ok(None) => {
                info!(code = %code, "No saved geometry, keeping window defaults");
                return false;
            }
            Err(e) => {
                error!(code = %code, store = self.store.name(), error = %e, "Failed to read saved geometry");
                return false;
            }
        };

        let record = self.clamp(record);
        window.set_position(record.x, record.y);
        window.set_size(record.width, record.height);
        window.set_maximized(record.maximized);
        window.relayout();

        info!(code = %code, x = record.x, y = record.y, width = record.width, height = record.height, maximized = record.maximized, "Restored window geometry");
        true
    }

    /// Store the current geometry of `window` under `code`
    pub fn capture(&self, window: &dyn WindowHandle, code: &str) -> StoreResult<GeometryRecord> {
        let record = self.clamp(record_from_window(window));
        self.store.put(code, &record)?;
        Ok(record)
    }

    /// Store the geometry of `window` under `code` once it closes
    ///
    /// Failures are logged and swallowed so closing the window always goes
    /// through.
    pub fn capture_on_close(&self, window: &dyn WindowHandle, code: &str) {
        let reconciler = self.clone();
        let code = code.to_string();
        window.on_close(Box::new(move |closed: &dyn WindowHandle| {
            if let Err(e) = reconciler.capture(closed, &code) {
                error!(code = %code, store = reconciler.store.name(), error = %e, "Failed to save window geometry on close");
            }
        }));
    }
}
