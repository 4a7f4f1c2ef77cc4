/*!
 * Key-value storage backends for queue snapshots.
 *
 * A backend stores opaque string values under string keys, the way browser
 * local storage does. Two implementations are provided:
 * - `FileStorage`: one JSON file per key in a data directory
 * - `MemoryStorage`: process-local map, with an optional size quota
 */

use anyhow::Result;
use log::{debug, info};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt::Debug;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::errors::PersistenceError;

/// Default directory name under the user's data directory
const DEFAULT_STORAGE_DIRNAME: &str = "bulk-translate";

/// Minimal key-value interface a snapshot store needs
pub trait KeyValueStorage: Send + Sync + Debug {
    /// Read the value stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError>;

    /// Remove `key`; removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<(), PersistenceError>;
}

/// Storage keeping one file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    /// Directory holding the value files
    dir: PathBuf,
}

impl FileStorage {
    /// Create storage rooted at `dir`, creating the directory if needed
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self, PersistenceError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| {
            PersistenceError::Unavailable(format!("cannot create {}: {}", dir.display(), e))
        })?;
        info!("Using snapshot storage at: {:?}", dir);
        Ok(Self { dir })
    }

    /// Create storage in the default location
    pub fn new_default() -> Result<Self> {
        let dir = Self::default_storage_dir()?;
        Ok(Self::new(dir)?)
    }

    /// Get the default storage directory
    pub fn default_storage_dir() -> Result<PathBuf> {
        let base_dir = dirs::data_local_dir()
            .or_else(dirs::data_dir)
            .or_else(|| dirs::home_dir().map(|h| h.join(".local").join("share")))
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;

        Ok(base_dir.join(DEFAULT_STORAGE_DIRNAME))
    }

    /// Directory holding the value files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", file_name))
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let path = self.path_for(key);
        // Write next to the target and rename so a crash never leaves half a snapshot
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, value)?;
        fs::rename(&tmp_path, &path)?;
        debug!("Stored {} bytes under '{}'", value.len(), key);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory storage, optionally refusing values above a byte quota
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryStorage {
    /// Unlimited in-memory storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that rejects any value longer than `quota_bytes`
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            values: Mutex::new(HashMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Write a raw value, bypassing the quota
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.values.lock().insert(key.to_string(), value.to_string());
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        if let Some(quota) = self.quota_bytes {
            if value.len() > quota {
                return Err(PersistenceError::Unavailable(format!(
                    "quota exceeded ({} > {} bytes)",
                    value.len(),
                    quota
                )));
            }
        }
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        self.values.lock().remove(key);
        Ok(())
    }
}
