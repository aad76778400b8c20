use anyhow::Result;
use tracing::{debug, info};
use x11rb::protocol::Event;

use crate::x11_utils::X11Window;

/// Whether a watched window is still around after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchStatus {
    Open,
    Closed,
}

/// Feed one X11 event into the tracked `window`
///
/// Geometry changes refresh the cached geometry; destruction fires the close
/// handler with whatever was cached last.
pub fn handle_event(window: &X11Window, event: Event) -> Result<WatchStatus> {
    match event {
        Event::ConfigureNotify(event) if event.window == window.id() => {
            window.refresh()?;
        }
        Event::PropertyNotify(event)
            if event.window == window.id() && event.atom == window.atoms().net_wm_state =>
        {
            window.refresh_maximized()?;
        }
        Event::PropertyNotify(event)
            if event.window == window.id() && event.atom == window.atoms().net_frame_extents =>
        {
            window.refresh()?;
        }
        Event::DestroyNotify(event) if event.window == window.id() => {
            info!(window = event.window, "Window destroyed");
            if !window.fire_close() {
                debug!(window = event.window, "No close handler registered");
            }
            return Ok(WatchStatus::Closed);
        }
        _ => {}
    }
    Ok(WatchStatus::Open)
}
