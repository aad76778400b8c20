//! Settings for the `window-restorer` binary
//!
//! Resolves where the geometry file lives and how verbose logging is.
//! Command-line flags win over `LOG_LEVEL`, which wins over the defaults.

use std::env;
use std::path::PathBuf;
use std::rc::Rc;
use tracing::{Level, warn};

use crate::persistence::{GeometryStore, JsonFileStore, MemoryStore, StoreResult};

/// Where the geometry document is read from and written to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// Explicit file path
    File(PathBuf),
    /// `<config_dir>/<app>/window-geometry.json`
    App(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub store: StoreLocation,
    pub log_level: Level,
}

impl Config {
    /// Combine command-line values with the environment
    pub fn resolve(file: Option<PathBuf>, app: &str, log_level: Option<&str>) -> Self {
        let store = match file {
            Some(path) => StoreLocation::File(path),
            None => StoreLocation::App(app.to_string()),
        };
        let log_level = match log_level {
            Some(level) => parse_log_level(level),
            None => parse_log_level(&env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string())),
        };
        Self { store, log_level }
    }

    /// JSON store at the configured location
    pub fn json_store(&self) -> StoreResult<JsonFileStore> {
        match &self.store {
            StoreLocation::File(path) => Ok(JsonFileStore::new(path.clone())),
            StoreLocation::App(app) => JsonFileStore::for_app(app),
        }
    }

    /// Store to hand to the reconciler
    ///
    /// Falls back to an in-memory store when no location can be resolved, so
    /// restore becomes a no-op instead of an error.
    pub fn open_store(&self) -> Rc<dyn GeometryStore> {
        match self.json_store() {
            Ok(store) => Rc::new(store),
            Err(e) => {
                warn!(error = %e, "No persistence available, geometry will not be kept");
                Rc::new(MemoryStore::new())
            }
        }
    }
}

/// Map a level name to a tracing level, defaulting to INFO
pub fn parse_log_level(raw: &str) -> Level {
    match raw.trim().to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}
