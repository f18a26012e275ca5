// SPDX-License-Identifier: MPL-2.0

//! Durable key/value storage for user preferences.

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
    sync::Mutex,
};

use crate::error::{BackdropError, Result};

/// Key under which the theme is persisted.
pub const THEME_KEY: &str = "theme";

/// String key/value store that survives restarts.
///
/// Writes are synchronous: once `set` returns `Ok`, a fresh reader sees the
/// new value.
pub trait PreferenceStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Preferences kept in a RON map on disk.
///
/// The whole map is rewritten on every `set`, through a temporary file that is
/// renamed over the original.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Open the file at `path`. A missing file starts empty; an unparsable one
    /// is logged and also starts empty, to be replaced on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let values = match fs::read_to_string(&path) {
            Ok(contents) => match ron::from_str::<BTreeMap<String, String>>(&contents) {
                Ok(values) => values,
                Err(source) => {
                    let why = BackdropError::StorageParse {
                        path: path.clone(),
                        source,
                    };
                    tracing::warn!(?why, "Discarding unreadable preferences");
                    BTreeMap::new()
                }
            },
            Err(why) if why.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(BackdropError::Storage { path, source }),
        };

        tracing::debug!(path = %path.display(), entries = values.len(), "Preferences loaded");

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> Result<()> {
        let contents = ron::ser::to_string_pretty(values, ron::ser::PrettyConfig::default())?;
        let storage_err = |source| BackdropError::Storage {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(storage_err)?;
        }

        let tmp = self.path.with_extension("ron.tmp");
        fs::write(&tmp, contents).map_err(storage_err)?;
        fs::rename(&tmp, &self.path).map_err(storage_err)
    }
}

impl PreferenceStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.lock().unwrap();

        // memory only changes once the file does
        let mut next = values.clone();
        next.insert(key.to_owned(), value.to_owned());
        self.persist(&next)?;
        *values = next;
        Ok(())
    }
}

/// Process-local storage, lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with an existing value, as if written by an earlier run.
    pub fn with_value(key: &str, value: &str) -> Self {
        let storage = Self::default();
        storage
            .values
            .lock()
            .unwrap()
            .insert(key.to_owned(), value.to_owned());
        storage
    }
}

impl PreferenceStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}
