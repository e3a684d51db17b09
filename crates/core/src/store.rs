//! Durable key-value storage for the override blob.
//!
//! The core only needs `save(key, value)` and `load(key)`. [`FileStore`]
//! keeps one `<key>.json` per key in the app data dir; [`MemoryStore`] is
//! for tests and hosts that persist elsewhere. [`BindingStore`] sits on top
//! and speaks [`BindingOverrides`] instead of strings.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::bindings::overrides::{BindingOverrides, OverridesError};
use crate::core_log::CoreLog;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid storage key '{0}'")]
    InvalidKey(String),
    #[error("{path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("no user data directory available")]
    NoDataDir,
    #[error(transparent)]
    Encode(#[from] OverridesError),
}

pub trait KeyValueStore: Send + Sync {
    fn save(&self, key: &str, value: &str) -> Result<(), StoreError>;
    /// `Ok(None)` when nothing was saved under `key`.
    fn load(&self, key: &str) -> Result<Option<String>, StoreError>;
}

#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        check_key(key)?;
        self.entries
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        check_key(key)?;
        Ok(self.entries.read().get(key).cloned())
    }
}

/// One file per key under a directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Use `dir` as is; it is created on first save.
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    /// `<user data dir>/<app_id>`, e.g. `%APPDATA%\io.input-starter` on Windows.
    pub fn in_app_data(app_id: &str) -> Result<Self, StoreError> {
        let base = directories::BaseDirs::new().ok_or(StoreError::NoDataDir)?;
        Ok(Self::new(base.data_dir().join(app_id)))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<dir>/<key>.json` (does not create it).
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        check_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let io = |source| StoreError::Io {
            path: path.display().to_string(),
            source,
        };
        fs::create_dir_all(&self.dir).map_err(io)?;
        // Write next to the target and rename so a crash never leaves half a blob.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(io)?;
        fs::rename(&tmp, &path).map_err(io)
    }

    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        if !path.try_exists().unwrap_or(false) {
            return Ok(None);
        }
        fs::read_to_string(&path)
            .map(Some)
            .map_err(|source| StoreError::Io {
                path: path.display().to_string(),
                source,
            })
    }
}

// Keys become file names, so keep them to a safe alphabet.
fn check_key(key: &str) -> Result<(), StoreError> {
    let ok = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        && !key.starts_with('.');
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

/// Override persistence on top of any [`KeyValueStore`].
#[derive(Clone)]
pub struct BindingStore {
    backend: Arc<dyn KeyValueStore>,
    logger: Arc<dyn CoreLog>,
}

impl BindingStore {
    pub fn new(backend: Arc<dyn KeyValueStore>, logger: Arc<dyn CoreLog>) -> Self {
        Self { backend, logger }
    }

    pub fn save(&self, key: &str, overrides: &BindingOverrides) -> Result<(), StoreError> {
        let blob = overrides.to_json()?;
        self.backend.save(key, &blob)?;
        self.logger.info(&format!(
            "[store] saved {} override(s) under '{key}'",
            overrides.len()
        ));
        Ok(())
    }

    /// Saved overrides under `key`. Read and decode failures are logged and
    /// reported as `None`, same as a missing key.
    pub fn load(&self, key: &str) -> Option<BindingOverrides> {
        let blob = match self.backend.load(key) {
            Ok(Some(blob)) => blob,
            Ok(None) => {
                self.logger.debug(&format!("[store] nothing saved under '{key}'"));
                return None;
            }
            Err(e) => {
                self.logger.warn(&format!("[store] load '{key}': {e}"));
                return None;
            }
        };
        match BindingOverrides::from_json(&blob) {
            Ok(table) => {
                self.logger.info(&format!(
                    "[store] loaded {} override(s) from '{key}'",
                    table.len()
                ));
                Some(table)
            }
            Err(e) => {
                self.logger.warn(&format!("[store] decode '{key}': {e}"));
                None
            }
        }
    }

    /// Raw blob access for import/export tooling.
    pub fn backend(&self) -> &Arc<dyn KeyValueStore> {
        &self.backend
    }
}
