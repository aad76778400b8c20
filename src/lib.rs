#![forbid(unsafe_code)]

//! Remember where application windows were and put them back there.
//!
//! Geometry is stored per window-code in a JSON file ([`JsonFileStore`]) and
//! applied through [`GeometryReconciler`], which keeps windows on screen when a
//! single monitor is attached. The window and screen APIs are reached through
//! the [`WindowHandle`] and [`ScreenEnumerator`] traits; an X11 implementation
//! of both lives in [`x11_utils`].

pub mod config;
pub mod constants;
pub mod event_handler;
pub mod persistence;
pub mod reconcile;
pub mod types;
pub mod x11_utils;

pub use persistence::{
    GeometryDocument, GeometryStore, JsonFileStore, MemoryStore, StoreError, StoreResult,
};
pub use reconcile::{
    CloseHandler, GeometryReconciler, ScreenEnumerator, WindowHandle, clamp_to_screen,
    clamp_to_screens, record_from_window,
};
pub use types::{GeometryRecord, ScreenBounds};
