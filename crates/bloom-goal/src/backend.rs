// backend.rs — Key-value persistence backends.
//
// The goal store only needs two operations: read a string under a key and
// replace the string under a key. Anything that can do that atomically per
// key (browser local storage, a file per key, a test map) can back the store.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::GoalError;

/// String-valued storage addressed by key.
///
/// `set` replaces the whole value for a key; there are no partial updates and
/// no transactions spanning keys.
pub trait KeyValueBackend: Send {
    /// Read the value under `key`. `Ok(None)` when the key was never written.
    fn get(&self, key: &str) -> Result<Option<String>, GoalError>;

    /// Write `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> Result<(), GoalError>;
}

/// In-process backend.
///
/// An optional quota mimics the size limit of browser storage: values larger
/// than the quota are refused and the previous value is kept.
#[derive(Debug, Default, Clone)]
pub struct MemoryBackend {
    entries: HashMap<String, String>,
    quota_bytes: Option<usize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: HashMap::new(),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Seed a raw value, bypassing the quota. Useful for loading fixtures.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }
}

impl KeyValueBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, GoalError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), GoalError> {
        if let Some(limit) = self.quota_bytes {
            if value.len() > limit {
                return Err(GoalError::QuotaExceeded {
                    key: key.to_string(),
                    size: value.len(),
                    limit,
                });
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One file per key: `<dir>/<key>.json`.
///
/// Writes go to a sibling temp file which is then renamed over the target,
/// so readers see either the old or the new value.
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Create a backend rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, GoalError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|source| GoalError::IoError {
            path: dir.display().to_string(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_file(&self, key: &str) -> Result<PathBuf, GoalError> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(GoalError::Backend(format!("invalid storage key '{}'", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>, GoalError> {
        let path = self.key_file(key)?;
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).map_err(|source| GoalError::IoError {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Some(content))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), GoalError> {
        let path = self.key_file(key)?;
        let tmp = self.dir.join(format!(".{}.json.tmp", key));
        fs::write(&tmp, value).map_err(|source| GoalError::IoError {
            path: tmp.display().to_string(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| GoalError::IoError {
            path: path.display().to_string(),
            source,
        })?;
        Ok(())
    }
}
