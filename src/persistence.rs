//! Window geometry persistence
//!
//! A [`GeometryStore`] maps window-codes to [`GeometryRecord`]s. The on-disk
//! backend, [`JsonFileStore`], keeps one JSON object per file:
//!
//! ```text
//! { "<code>": { "x": 10, "y": 20, "w": 800, "h": 600, "max": false } }
//! ```
//!
//! Every `get`/`put` is a full read-modify-write of that file; no handle is
//! kept open between calls.
//!
//! # Recovery
//!
//! A missing file, or one that is not a JSON object, is replaced by `{}` on
//! the first access. This is destructive: the corrupt bytes are overwritten
//! and cannot be recovered afterwards.
//!
//! # Concurrency
//!
//! There is no file locking. Two processes sharing one file race and the last
//! `put` wins.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::constants::{config, keys};
use crate::types::GeometryRecord;

// ==============================================================================
// Errors
// ==============================================================================

/// Errors surfaced by a [`GeometryStore`]
///
/// A corrupt file is not an error: it is reset in place.
#[derive(Debug)]
pub enum StoreError {
    /// Reading or writing the backing file failed
    Io { path: PathBuf, source: io::Error },
    /// The document could not be encoded
    Serialization(serde_json::Error),
    /// No backend could be resolved for this call
    Unavailable(String),
}

impl StoreError {
    fn io(path: &Path, source: io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io { path, source } => {
                write!(f, "I/O error on {}: {source}", path.display())
            }
            StoreError::Serialization(e) => write!(f, "serialization error: {e}"),
            StoreError::Unavailable(msg) => write!(f, "geometry store unavailable: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io { source, .. } => Some(source),
            StoreError::Serialization(e) => Some(e),
            StoreError::Unavailable(_) => None,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

// ==============================================================================
// Store trait
// ==============================================================================

/// Durable mapping window-code → [`GeometryRecord`]
pub trait GeometryStore {
    /// Backend name for log lines
    fn name(&self) -> &str;

    /// Stored record for `code`, `None` if nothing was saved under it
    fn get(&self, code: &str) -> StoreResult<Option<GeometryRecord>>;

    /// Insert or replace the record for `code` and persist it
    fn put(&self, code: &str, record: &GeometryRecord) -> StoreResult<()>;

    /// Stored record for `code`, or `fallback` (usually the window's current
    /// geometry) when nothing was saved
    fn get_or(&self, code: &str, fallback: GeometryRecord) -> StoreResult<GeometryRecord> {
        Ok(self.get(code)?.unwrap_or(fallback))
    }
}

// ==============================================================================
// Document
// ==============================================================================

/// In-memory copy of the geometry file
///
/// Kept as a raw JSON map so keys this crate does not know about survive a
/// rewrite, both at the top level and inside a window entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometryDocument {
    entries: Map<String, Value>,
}

impl GeometryDocument {
    /// Parse file contents; anything but a JSON object is an error
    pub fn parse(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let entries: Map<String, Value> = serde_json::from_slice(bytes)?;
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.entries
    }

    /// Record stored under `code`, with missing fields defaulted
    ///
    /// Entries that are not objects or carry a field of the wrong type are
    /// reported as absent. The next [`set_record`](Self::set_record) for the
    /// same code overwrites them.
    pub fn record(&self, code: &str) -> Option<GeometryRecord> {
        let entry = self.entries.get(code)?;
        match GeometryRecord::deserialize(entry) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(code = %code, error = %e, "Ignoring unreadable window entry");
                None
            }
        }
    }

    /// Write the five geometry keys into the entry for `code`
    ///
    /// Other keys already present in that entry are kept.
    pub fn set_record(&mut self, code: &str, record: &GeometryRecord) {
        let slot = self
            .entries
            .entry(code.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        if let Value::Object(fields) = slot {
            fields.insert(keys::X.to_string(), record.x.into());
            fields.insert(keys::Y.to_string(), record.y.into());
            fields.insert(keys::WIDTH.to_string(), record.width.into());
            fields.insert(keys::HEIGHT.to_string(), record.height.into());
            fields.insert(keys::MAXIMIZED.to_string(), record.maximized.into());
        }
    }
}

// ==============================================================================
// JSON file backend
// ==============================================================================

/// Geometry store backed by a single JSON file
///
/// Writes go to `<file>.tmp` first, are synced, then renamed over the target.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Store at `path`; the file is created on first access
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<config_dir>/<app_name>/window-geometry.json`
    pub fn for_app(app_name: &str) -> StoreResult<Self> {
        let dir = dirs::config_dir().ok_or_else(|| {
            StoreError::Unavailable("could not determine the user config directory".to_string())
        })?;
        Ok(Self::new(dir.join(app_name).join(config::FILENAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File that actually gets written
    ///
    /// When the configured path is a symlink the link is left in place and its
    /// target is rewritten instead, even if the target does not exist yet.
    fn target_path(&self) -> PathBuf {
        match fs::symlink_metadata(&self.path) {
            Ok(meta) if meta.file_type().is_symlink() => match fs::canonicalize(&self.path) {
                Ok(target) => target,
                Err(_) => match fs::read_link(&self.path) {
                    Ok(link) => match self.path.parent() {
                        Some(parent) => parent.join(link),
                        None => link,
                    },
                    Err(e) => {
                        warn!(path = %self.path.display(), error = %e, "Could not resolve symlink, writing the path itself");
                        self.path.clone()
                    }
                },
            },
            _ => self.path.clone(),
        }
    }

    /// Read the whole document, resetting a missing or corrupt file to `{}`
    pub fn load(&self) -> StoreResult<GeometryDocument> {
        match fs::read(&self.path) {
            Ok(bytes) => match GeometryDocument::parse(&bytes) {
                Ok(document) => {
                    debug!(path = %self.path.display(), entries = document.len(), "Loaded window geometry");
                    return Ok(document);
                }
                Err(e) => {
                    error!(path = %self.path.display(), error = %e, "Window geometry file is not a JSON object, resetting it");
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "No window geometry file yet, creating an empty one");
            }
            Err(e) => return Err(StoreError::io(&self.path, e)),
        }

        let document = GeometryDocument::default();
        self.save(&document)?;
        Ok(document)
    }

    /// Replace the file with `document`
    pub fn save(&self, document: &GeometryDocument) -> StoreResult<()> {
        let target = self.target_path();
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        let tmp_path = temp_path_for(&target);
        {
            let file = File::create(&tmp_path).map_err(|e| StoreError::io(&tmp_path, e))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, document.as_map()).map_err(|e| {
                if e.is_io() {
                    StoreError::io(&tmp_path, e.into())
                } else {
                    StoreError::Serialization(e)
                }
            })?;
            writer.flush().map_err(|e| StoreError::io(&tmp_path, e))?;
            writer
                .get_ref()
                .sync_all()
                .map_err(|e| StoreError::io(&tmp_path, e))?;
        }

        fs::rename(&tmp_path, &target).map_err(|e| StoreError::io(&target, e))?;
        debug!(path = %target.display(), entries = document.len(), "Saved window geometry");
        Ok(())
    }
}

fn temp_path_for(target: &Path) -> PathBuf {
    let mut tmp = target.to_path_buf();
    tmp.set_extension(config::TEMP_EXTENSION);
    tmp
}

impl GeometryStore for JsonFileStore {
    fn name(&self) -> &str {
        "JsonFileStore"
    }

    fn get(&self, code: &str) -> StoreResult<Option<GeometryRecord>> {
        let record = self.load()?.record(code);
        if record.is_none() {
            info!(code = %code, "No window geometry stored for code");
        }
        Ok(record)
    }

    fn put(&self, code: &str, record: &GeometryRecord) -> StoreResult<()> {
        let mut document = self.load()?;
        document.set_record(code, record);
        self.save(&document)?;
        info!(code = %code, x = record.x, y = record.y, width = record.width, height = record.height, maximized = record.maximized, "Stored window geometry");
        Ok(())
    }
}

// ==============================================================================
// In-memory backend
// ==============================================================================

/// Geometry store that never touches the disk
///
/// Used when no config directory is available, and in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RefCell<HashMap<String, GeometryRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }
}

impl GeometryStore for MemoryStore {
    fn name(&self) -> &str {
        "MemoryStore"
    }

    fn get(&self, code: &str) -> StoreResult<Option<GeometryRecord>> {
        Ok(self.records.borrow().get(code).copied())
    }

    fn put(&self, code: &str, record: &GeometryRecord) -> StoreResult<()> {
        self.records.borrow_mut().insert(code.to_string(), *record);
        Ok(())
    }
}
