//! Key-value record storage: an in-memory map and a RON file that rewrites itself on every set.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use bevy::log::{info, warn};
use bevy::prelude::Resource;
use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::host::PersistentStore;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryStore {
    ints: BTreeMap<String, i32>,
    floats: BTreeMap<String, f32>,
}

impl PersistentStore for MemoryStore {
    fn get_int(&self, key: &str) -> Option<i32> {
        self.ints.get(key).copied()
    }

    fn set_int(&mut self, key: &str, value: i32) {
        self.ints.insert(key.to_owned(), value);
    }

    fn get_float(&self, key: &str) -> Option<f32> {
        self.floats.get(key).copied()
    }

    fn set_float(&mut self, key: &str, value: f32) {
        self.floats.insert(key.to_owned(), value);
    }
}

/// Records persisted to a RON file.
#[derive(Resource, Debug)]
pub struct RonFileStore {
    path: PathBuf,
    records: MemoryStore,
}

impl RonFileStore {
    /// Loads `path`; a missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let records = match fs::read_to_string(&path) {
            Ok(contents) => ron::from_str(&contents).map_err(|source| StoreError::Parse {
                path: path.clone(),
                source,
            })?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => MemoryStore::default(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        Ok(Self { path, records })
    }

    /// Like [`RonFileStore::open`], but starts empty when the file cannot be used.
    pub fn open_or_empty(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match Self::open(&path) {
            Ok(store) => {
                info!("Loaded records from {}", path.display());
                store
            }
            Err(err) => {
                warn!("{err}; starting with empty records");
                Self {
                    path,
                    records: MemoryStore::default(),
                }
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self) -> Result<(), StoreError> {
        let contents = ron::ser::to_string_pretty(&self.records, PrettyConfig::default())?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&self.path, contents).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }

    fn persist(&self) {
        if let Err(err) = self.save() {
            warn!("Record not persisted: {err}");
        }
    }
}

impl PersistentStore for RonFileStore {
    fn get_int(&self, key: &str) -> Option<i32> {
        self.records.get_int(key)
    }

    fn set_int(&mut self, key: &str, value: i32) {
        self.records.set_int(key, value);
        self.persist();
    }

    fn get_float(&self, key: &str) -> Option<f32> {
        self.records.get_float(key)
    }

    fn set_float(&mut self, key: &str, value: f32) {
        self.records.set_float(key, value);
        self.persist();
    }
}
