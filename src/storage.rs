//! Local persistent key/value storage.
//!
//! The widget persists exactly two values: the session identifier and the theme preference.
//! [`FileStorage`] keeps them in a small JSON object on disk; [`MemoryStorage`] keeps them for
//! the lifetime of the process.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde_json::{from_reader, to_writer_pretty};

use crate::error::{Error, Result};

/// Key under which the session identifier is stored.
pub const SESSION_KEY: &str = "ragchat.session_id";

/// Key under which the theme preference is stored.
pub const THEME_KEY: &str = "ragchat.theme";

/// Environment variable naming the storage file.
pub const STATE_PATH_ENV: &str = "RAGCHAT_STATE";

/// A string key/value store.
pub trait Storage: Send {
    /// Returns the value stored under `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Deletes `key`.  Deleting a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Storage that lives only as long as the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    values: BTreeMap<String, String>,
}

impl MemoryStorage {
    /// Creates empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates storage pre-populated with `key` = `value`.
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// Storage backed by a pretty-printed JSON object file.
///
/// The whole file is read on open and rewritten on every change.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileStorage {
    /// Opens the storage file at `path`.  A missing file is treated as empty storage and is only
    /// created on the first write.  An unreadable JSON body is logged and discarded; the stored
    /// values are a cache, and the next write replaces the file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let values: BTreeMap<String, String> = match File::open(&path) {
            Ok(file) => match from_reader(BufReader::new(file)) {
                Ok(values) => values,
                Err(err) => {
                    tracing::warn!(
                        path = %path.display(),
                        "discarding corrupt storage file: {}",
                        err
                    );
                    BTreeMap::new()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(Error::io("failed to open storage file", err)),
        };
        Ok(Self { path, values })
    }

    /// The default storage location: `$RAGCHAT_STATE`, else `$HOME/.ragchat.json`, else
    /// `.ragchat.json` in the working directory.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var(STATE_PATH_ENV) {
            return PathBuf::from(path);
        }
        match std::env::var("HOME") {
            Ok(home) => PathBuf::from(home).join(".ragchat.json"),
            Err(_) => PathBuf::from(".ragchat.json"),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn scratch_path(&self) -> PathBuf {
        let mut scratch = self.path.clone().into_os_string();
        scratch.push(".tmp");
        PathBuf::from(scratch)
    }

    /// Write to a sibling file and rename it into place, so the file on disk is always either
    /// the old contents or the new.
    fn flush(&self) -> Result<()> {
        let scratch = self.scratch_path();
        let file = File::create(&scratch)
            .map_err(|err| Error::io("failed to create storage file", err))?;
        let mut writer = BufWriter::new(file);
        to_writer_pretty(&mut writer, &self.values).map_err(|err| {
            Error::serialization("failed to serialize storage", Some(Box::new(err)))
        })?;
        writer
            .flush()
            .map_err(|err| Error::io("failed to write storage file", err))?;
        std::fs::rename(&scratch, &self.path)
            .map_err(|err| Error::io("failed to replace storage file", err))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.values.remove(key).is_some() {
            self.flush()
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("ragchat-{}-{}.json", std::process::id(), name))
    }

    #[test]
    fn memory_storage_roundtrip() {
        let mut storage = MemoryStorage::new().with(THEME_KEY, "dark");
        assert_eq!(storage.get(THEME_KEY).as_deref(), Some("dark"));
        assert_eq!(storage.get(SESSION_KEY), None);
        storage.set(SESSION_KEY, "s-1").unwrap();
        assert_eq!(storage.get(SESSION_KEY).as_deref(), Some("s-1"));
        storage.remove(SESSION_KEY).unwrap();
        storage.remove(SESSION_KEY).unwrap();
        assert_eq!(storage.get(SESSION_KEY), None);
    }

    #[test]
    fn file_storage_persists_across_opens() {
        let path = scratch_path("persist");
        let _ = std::fs::remove_file(&path);

        let mut storage = FileStorage::open(&path).unwrap();
        assert_eq!(storage.get(SESSION_KEY), None);
        assert!(!path.exists());
        storage.set(SESSION_KEY, "abc").unwrap();
        storage.set(THEME_KEY, "light").unwrap();

        let mut reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.get(SESSION_KEY).as_deref(), Some("abc"));
        assert_eq!(reopened.get(THEME_KEY).as_deref(), Some("light"));
        reopened.remove(SESSION_KEY).unwrap();

        let again = FileStorage::open(&path).unwrap();
        assert_eq!(again.get(SESSION_KEY), None);
        assert_eq!(again.get(THEME_KEY).as_deref(), Some("light"));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn file_storage_recovers_from_corrupt_file() {
        let path = scratch_path("corrupt");
        std::fs::write(&path, "{\"ragchat.session_id\": \"trunc").unwrap();

        let mut storage = FileStorage::open(&path).unwrap();
        assert_eq!(storage.get(SESSION_KEY), None);
        storage.set(THEME_KEY, "dark").unwrap();

        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.get(THEME_KEY).as_deref(), Some("dark"));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn file_storage_leaves_no_scratch_file() {
        let path = scratch_path("replace");
        let _ = std::fs::remove_file(&path);

        let mut storage = FileStorage::open(&path).unwrap();
        storage.set(SESSION_KEY, "abc").unwrap();
        storage.set(SESSION_KEY, "def").unwrap();

        assert!(path.exists());
        assert!(!storage.scratch_path().exists());
        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.get(SESSION_KEY).as_deref(), Some("def"));
        std::fs::remove_file(&path).unwrap();
    }
}
