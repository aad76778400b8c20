use anyhow::{Context, Result};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::{debug, error, warn};
use x11rb::connection::Connection;
use x11rb::protocol::randr::ConnectionExt as RandrExt;
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;

use crate::constants::x11;
use crate::reconcile::{CloseHandler, ScreenEnumerator, WindowHandle};
use crate::types::{GeometryRecord, ScreenBounds};

/// Shared X11 state: the connection, the screen in use and cached atoms
pub struct AppContext {
    pub conn: RustConnection,
    pub screen_num: usize,
    pub atoms: CachedAtoms,
}

impl AppContext {
    /// Connect to the display named by `$DISPLAY`
    pub fn connect() -> Result<Rc<Self>> {
        let (conn, screen_num) = x11rb::connect(None).context("Failed to connect to the X server")?;
        let atoms = CachedAtoms::new(&conn)?;
        Ok(Rc::new(Self {
            conn,
            screen_num,
            atoms,
        }))
    }

    pub fn screen(&self) -> &Screen {
        &self.conn.setup().roots[self.screen_num]
    }
}

/// Pre-cached X11 atoms to avoid repeated roundtrips
pub struct CachedAtoms {
    pub net_wm_state: Atom,
    pub net_wm_state_maximized_vert: Atom,
    pub net_wm_state_maximized_horz: Atom,
    pub net_frame_extents: Atom,
}

impl CachedAtoms {
    pub fn new(conn: &RustConnection) -> Result<Self> {
        Ok(Self {
            net_wm_state: intern(conn, "_NET_WM_STATE")?,
            net_wm_state_maximized_vert: intern(conn, "_NET_WM_STATE_MAXIMIZED_VERT")?,
            net_wm_state_maximized_horz: intern(conn, "_NET_WM_STATE_MAXIMIZED_HORZ")?,
            net_frame_extents: intern(conn, "_NET_FRAME_EXTENTS")?,
        })
    }
}

fn intern(conn: &RustConnection, name: &str) -> Result<Atom> {
    Ok(conn
        .intern_atom(false, name.as_bytes())
        .with_context(|| format!("Failed to intern {name} atom"))?
        .reply()
        .with_context(|| format!("Failed to get reply for {name} atom"))?
        .atom)
}

/// Parse a window id given in decimal or `0x`-prefixed hex
pub fn parse_window_id(raw: &str) -> Result<Window, std::num::ParseIntError> {
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => Window::from_str_radix(hex, 16),
        None => raw.parse(),
    }
}

/// Decoration sizes a reparenting window manager reports in `_NET_FRAME_EXTENTS`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameExtents {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,
}

impl FrameExtents {
    /// Parse the property value (`left, right, top, bottom`)
    ///
    /// A missing or short property means the window has no decorations.
    pub fn from_property(values: &[u32]) -> Self {
        let to_i32 = |v: u32| i32::try_from(v).unwrap_or(0);
        match values {
            [left, right, top, bottom, ..] => Self {
                left: to_i32(*left),
                right: to_i32(*right),
                top: to_i32(*top),
                bottom: to_i32(*bottom),
            },
            _ => Self::default(),
        }
    }

    /// Frame origin of a client whose inner top-left sits at (`client_x`, `client_y`)
    ///
    /// `ConfigureWindow` with the default NorthWest gravity places the frame,
    /// not the client, so positions are stored as frame origins.
    pub fn frame_origin(&self, client_x: i32, client_y: i32) -> (i32, i32) {
        (
            client_x.saturating_sub(self.left),
            client_y.saturating_sub(self.top),
        )
    }
}

// ==============================================================================
// Screens
// ==============================================================================

/// Screens reported by RandR, falling back to the root window size
pub struct X11Screens {
    ctx: Rc<AppContext>,
}

impl X11Screens {
    pub fn new(ctx: Rc<AppContext>) -> Self {
        Self { ctx }
    }

    fn monitors(&self) -> Result<Vec<ScreenBounds>> {
        let reply = self
            .ctx
            .conn
            .randr_get_monitors(self.ctx.screen().root, true)
            .context("Failed to query RandR monitors")?
            .reply()
            .context("Failed to get reply for RandR monitors query")?;
        Ok(reply
            .monitors
            .iter()
            .map(|m| ScreenBounds {
                x: i32::from(m.x),
                y: i32::from(m.y),
                width: i32::from(m.width),
                height: i32::from(m.height),
            })
            .collect())
    }

    fn root_bounds(&self) -> ScreenBounds {
        let screen = self.ctx.screen();
        ScreenBounds::sized(
            i32::from(screen.width_in_pixels),
            i32::from(screen.height_in_pixels),
        )
    }
}

impl ScreenEnumerator for X11Screens {
    fn list_screens(&self) -> Vec<ScreenBounds> {
        match self.monitors() {
            Ok(monitors) if !monitors.is_empty() => {
                debug!(count = monitors.len(), "Enumerated monitors");
                monitors
            }
            Ok(_) => {
                warn!("RandR reported no monitors, using root window size");
                vec![self.root_bounds()]
            }
            Err(e) => {
                warn!(error = %e, "RandR unavailable, using root window size");
                vec![self.root_bounds()]
            }
        }
    }
}

// ==============================================================================
// Windows
// ==============================================================================

/// Top-level X11 window tracked for geometry restore/capture
///
/// Geometry is cached so it can still be read once the window is gone;
/// `event_handler` keeps the cache current.
pub struct X11Window {
    ctx: Rc<AppContext>,
    id: Window,
    geometry: Cell<GeometryRecord>,
    close_handler: RefCell<Option<CloseHandler>>,
}

impl X11Window {
    /// Start tracking `id`: select structure/property events and snapshot its geometry
    pub fn new(ctx: Rc<AppContext>, id: Window) -> Result<Self> {
        ctx.conn
            .change_window_attributes(
                id,
                &ChangeWindowAttributesAux::new()
                    .event_mask(EventMask::STRUCTURE_NOTIFY | EventMask::PROPERTY_CHANGE),
            )
            .context(format!("Failed to select events on window {}", id))?;

        let window = Self {
            ctx,
            id,
            geometry: Cell::new(GeometryRecord::default()),
            close_handler: RefCell::new(None),
        };
        window.refresh()?;
        Ok(window)
    }

    pub fn id(&self) -> Window {
        self.id
    }

    pub fn atoms(&self) -> &CachedAtoms {
        &self.ctx.atoms
    }

    /// Re-read position, size and maximized state from the server
    pub fn refresh(&self) -> Result<()> {
        let conn = &self.ctx.conn;
        let geom = conn
            .get_geometry(self.id)
            .context(format!("Failed to query geometry of window {}", self.id))?
            .reply()
            .context(format!("Failed to get geometry reply for window {}", self.id))?;
        let origin = conn
            .translate_coordinates(self.id, self.ctx.screen().root, 0, 0)
            .context(format!("Failed to translate coordinates of window {}", self.id))?
            .reply()
            .context(format!("Failed to get coordinate reply for window {}", self.id))?;

        let (x, y) = self
            .query_frame_extents()?
            .frame_origin(i32::from(origin.dst_x), i32::from(origin.dst_y));

        self.geometry.set(GeometryRecord::new(
            x,
            y,
            i32::from(geom.width),
            i32::from(geom.height),
            self.query_maximized()?,
        ));
        debug!(window = self.id, geometry = ?self.geometry.get(), "Refreshed window geometry");
        Ok(())
    }

    /// Re-read only the maximized flag
    pub fn refresh_maximized(&self) -> Result<()> {
        let mut geometry = self.geometry.get();
        geometry.maximized = self.query_maximized()?;
        self.geometry.set(geometry);
        Ok(())
    }

    fn query_frame_extents(&self) -> Result<FrameExtents> {
        let prop = self
            .ctx
            .conn
            .get_property(false, self.id, self.ctx.atoms.net_frame_extents, AtomEnum::CARDINAL, 0, 4)
            .context(format!("Failed to query _NET_FRAME_EXTENTS for window {}", self.id))?
            .reply()
            .context(format!("Failed to get _NET_FRAME_EXTENTS reply for window {}", self.id))?;
        let values: Vec<u32> = prop.value32().map(|v| v.collect()).unwrap_or_default();
        Ok(FrameExtents::from_property(&values))
    }

    fn query_maximized(&self) -> Result<bool> {
        let atoms = &self.ctx.atoms;
        let prop = self
            .ctx
            .conn
            .get_property(false, self.id, atoms.net_wm_state, AtomEnum::ATOM, 0, 1024)
            .context(format!("Failed to query _NET_WM_STATE for window {}", self.id))?
            .reply()
            .context(format!("Failed to get _NET_WM_STATE reply for window {}", self.id))?;
        let states: Vec<Atom> = prop.value32().map(|v| v.collect()).unwrap_or_default();
        Ok(states.contains(&atoms.net_wm_state_maximized_vert)
            && states.contains(&atoms.net_wm_state_maximized_horz))
    }

    /// Run the registered close handler, if any; returns whether one ran
    pub fn fire_close(&self) -> bool {
        let handler = self.close_handler.borrow_mut().take();
        match handler {
            Some(handler) => {
                handler(self);
                true
            }
            None => false,
        }
    }

    fn configure(&self, aux: &ConfigureWindowAux) -> Result<()> {
        self.ctx
            .conn
            .configure_window(self.id, aux)
            .context(format!("Failed to configure window {}", self.id))?;
        Ok(())
    }

    fn send_maximized(&self, maximized: bool) -> Result<()> {
        let atoms = &self.ctx.atoms;
        let action = if maximized {
            x11::NET_WM_STATE_ADD
        } else {
            x11::NET_WM_STATE_REMOVE
        };
        let event = ClientMessageEvent {
            response_type: CLIENT_MESSAGE_EVENT,
            format: 32,
            sequence: 0,
            window: self.id,
            type_: atoms.net_wm_state,
            data: ClientMessageData::from([
                action,
                atoms.net_wm_state_maximized_vert,
                atoms.net_wm_state_maximized_horz,
                x11::SOURCE_INDICATION_PAGER,
                0,
            ]),
        };

        self.ctx
            .conn
            .send_event(
                false,
                self.ctx.screen().root,
                EventMask::SUBSTRUCTURE_NOTIFY | EventMask::SUBSTRUCTURE_REDIRECT,
                &event,
            )
            .context(format!("Failed to send _NET_WM_STATE event for window {}", self.id))?;
        Ok(())
    }
}

impl WindowHandle for X11Window {
    fn position(&self) -> (i32, i32) {
        self.geometry.get().position()
    }

    fn size(&self) -> (i32, i32) {
        self.geometry.get().size()
    }

    fn is_maximized(&self) -> bool {
        self.geometry.get().maximized
    }

    fn set_position(&self, x: i32, y: i32) {
        let mut geometry = self.geometry.get();
        geometry.x = x;
        geometry.y = y;
        self.geometry.set(geometry);
        if let Err(e) = self.configure(&ConfigureWindowAux::new().x(x).y(y)) {
            error!(window = self.id, error = %e, "Failed to move window");
        }
    }

    fn set_size(&self, width: i32, height: i32) {
        let mut geometry = self.geometry.get();
        geometry.width = width;
        geometry.height = height;
        self.geometry.set(geometry);
        // X11 rejects zero-sized windows
        let width = u32::try_from(width.max(1)).unwrap_or(1);
        let height = u32::try_from(height.max(1)).unwrap_or(1);
        if let Err(e) = self.configure(&ConfigureWindowAux::new().width(width).height(height)) {
            error!(window = self.id, error = %e, "Failed to resize window");
        }
    }

    fn set_maximized(&self, maximized: bool) {
        let mut geometry = self.geometry.get();
        geometry.maximized = maximized;
        self.geometry.set(geometry);
        if let Err(e) = self.send_maximized(maximized) {
            error!(window = self.id, error = %e, "Failed to change maximized state");
        }
    }

    fn relayout(&self) {
        if let Err(e) = self.ctx.conn.flush() {
            error!(window = self.id, error = %e, "Failed to flush X11 connection");
        }
    }

    fn on_close(&self, handler: CloseHandler) {
        *self.close_handler.borrow_mut() = Some(handler);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_extents_from_property() {
        assert_eq!(
            FrameExtents::from_property(&[2, 2, 30, 2]),
            FrameExtents {
                left: 2,
                right: 2,
                top: 30,
                bottom: 2,
            }
        );
        assert_eq!(FrameExtents::from_property(&[]), FrameExtents::default());
        assert_eq!(FrameExtents::from_property(&[5, 5]), FrameExtents::default());
    }

    #[test]
    fn test_frame_origin_subtracts_decorations() {
        let extents = FrameExtents::from_property(&[4, 4, 30, 4]);
        assert_eq!(extents.frame_origin(204, 230), (200, 200));
    }

    #[test]
    fn test_frame_origin_is_stable_across_restore_cycles() {
        // Restoring (x, y) puts the frame there, so the client lands at (x + left, y + top)
        let extents = FrameExtents::from_property(&[4, 4, 30, 4]);
        let mut stored = extents.frame_origin(204, 230);
        for _ in 0..3 {
            let client = (stored.0 + extents.left, stored.1 + extents.top);
            stored = extents.frame_origin(client.0, client.1);
        }
        assert_eq!(stored, (200, 200));
    }

    #[test]
    fn test_undecorated_window_keeps_client_origin() {
        assert_eq!(FrameExtents::default().frame_origin(-15, 40), (-15, 40));
    }

    #[test]
    fn test_parse_window_id_decimal() {
        assert_eq!(parse_window_id("12345").unwrap(), 12345);
    }

    #[test]
    fn test_parse_window_id_hex() {
        assert_eq!(parse_window_id("0x3a00007").unwrap(), 0x3a00007);
        assert_eq!(parse_window_id("0XFF").unwrap(), 255);
    }

    #[test]
    fn test_parse_window_id_rejects_garbage() {
        assert!(parse_window_id("window").is_err());
        assert!(parse_window_id("0xZZ").is_err());
        assert!(parse_window_id("").is_err());
    }
}
