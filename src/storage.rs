//! Durable key/value storage for the session.
//!
//! [`FileStorage`] keeps every entry in one JSON object on disk and rewrites
//! the whole file on each change, so a multi-key update either lands
//! completely or not at all. [`MemoryStorage`] is the non-durable
//! counterpart used by tests.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Name of the storage file inside the data directory.
pub const STORAGE_FILE: &str = "storage.json";

/// String key/value storage that survives process restarts.
pub trait Storage {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores every pair in `entries` as a single update.
    fn set_all(&mut self, entries: &[(&str, String)]) -> Result<()>;

    /// Removes every key in `keys` as a single update.
    fn remove_all(&mut self, keys: &[&str]) -> Result<()>;

    /// Stores `value` under `key`.
    fn set(&mut self, key: &str, value: String) -> Result<()> {
        self.set_all(&[(key, value)])
    }

    /// Removes `key`.
    fn remove(&mut self, key: &str) -> Result<()> {
        self.remove_all(&[key])
    }
}

/////////////////////////////////////////// MemoryStorage //////////////////////////////////////////

/// Storage that lives only as long as the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStorage {
    entries: BTreeMap<String, String>,
}

impl MemoryStorage {
    /// Creates an empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set_all(&mut self, entries: &[(&str, String)]) -> Result<()> {
        for (key, value) in entries {
            self.entries.insert(key.to_string(), value.clone());
        }
        Ok(())
    }

    fn remove_all(&mut self, keys: &[&str]) -> Result<()> {
        for key in keys {
            self.entries.remove(*key);
        }
        Ok(())
    }
}

//////////////////////////////////////////// FileStorage ///////////////////////////////////////////

/// Storage backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStorage {
    /// Opens the storage file inside `dir`, creating the directory if needed.
    pub fn open_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .map_err(|err| Error::io(format!("failed to create {}", dir.display()), err))?;
        Self::open(dir.join(STORAGE_FILE))
    }

    /// Opens the storage file at `path`.
    ///
    /// A missing file is an empty storage. An unreadable or corrupt file is an
    /// error: silently discarding it would lose the session.
    pub fn open<P: Into<PathBuf>>(path: P) -> Result<Self> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_str(&content).map_err(|err| {
                Error::serialization(
                    format!("failed to parse {}", path.display()),
                    Some(Box::new(err)),
                )
            })?,
            Err(err) if err.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                return Err(Error::io(
                    format!("failed to read {}", path.display()),
                    err,
                ));
            }
        };
        tracing::debug!(path = %path.display(), entries = entries.len(), "opened storage");
        Ok(Self { path, entries })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let content = serde_json::to_string_pretty(entries).map_err(|err| {
            Error::serialization("failed to serialize storage", Some(Box::new(err)))
        })?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content)
            .map_err(|err| Error::io(format!("failed to write {}", tmp.display()), err))?;
        fs::rename(&tmp, &self.path)
            .map_err(|err| Error::io(format!("failed to replace {}", self.path.display()), err))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set_all(&mut self, entries: &[(&str, String)]) -> Result<()> {
        let mut next = self.entries.clone();
        for (key, value) in entries {
            next.insert(key.to_string(), value.clone());
        }
        self.persist(&next)?;
        self.entries = next;
        Ok(())
    }

    fn remove_all(&mut self, keys: &[&str]) -> Result<()> {
        let mut next = self.entries.clone();
        for key in keys {
            next.remove(*key);
        }
        self.persist(&next)?;
        self.entries = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn memory_storage_set_and_remove() {
        let mut storage = MemoryStorage::new();
        storage.set("token", "abc".to_string()).unwrap();
        assert_eq!(storage.get("token"), Some("abc".to_string()));
        storage.remove("token").unwrap();
        assert_eq!(storage.get("token"), None);
        assert!(storage.is_empty());
    }

    #[test]
    fn file_storage_survives_reopen() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("aurum");
        let mut storage = FileStorage::open_dir(&dir).unwrap();
        storage
            .set_all(&[("token", "abc".to_string()), ("user", "{}".to_string())])
            .unwrap();

        let mut reopened = FileStorage::open_dir(&dir).unwrap();
        assert_eq!(reopened.get("token"), Some("abc".to_string()));
        assert_eq!(reopened.get("user"), Some("{}".to_string()));

        reopened.remove_all(&["token", "user"]).unwrap();
        let again = FileStorage::open_dir(&dir).unwrap();
        assert_eq!(again.get("token"), None);
        assert_eq!(again.get("user"), None);
        assert!(!dir.join("storage.json.tmp").exists());
    }

    #[test]
    fn missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("missing");
        let storage = FileStorage::open(dir.join(STORAGE_FILE)).unwrap();
        assert_eq!(storage.get("token"), None);
        assert!(!dir.exists());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(STORAGE_FILE), "{not json").unwrap();
        assert!(matches!(
            FileStorage::open_dir(temp.path()),
            Err(Error::Serialization { .. })
        ));
    }
}
