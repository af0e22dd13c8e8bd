//! Persistent token storage backends
//!
//! OAuth tokens are mirrored to a [`TokenStorage`] under a key namespaced by
//! client id. Every operation reports its outcome as a [`StorageResult`];
//! the token store decides what a failure means (it never treats one as
//! fatal).

use crate::error::{StorageError, StorageResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Prefix of every persisted token key
pub const STORAGE_KEY_PREFIX: &str = "autocloud_sdk_user_token";

/// Key under which the token for `client_id` is persisted
pub fn storage_key(client_id: &str) -> String {
    format!("{STORAGE_KEY_PREFIX}-{client_id}")
}

/// Synchronous key/value store for serialized tokens
pub trait TokenStorage: Send + Sync {
    /// Read the raw entry, `None` if absent
    fn read(&self, key: &str) -> StorageResult<Option<String>>;

    /// Write (replace) the raw entry
    fn write(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove the entry; removing a missing entry succeeds
    fn remove(&self, key: &str) -> StorageResult<()>;
}

// ============================================================================
// Memory Storage
// ============================================================================

/// Process-local storage
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStorage for MemoryStorage {
    fn read(&self, key: &str) -> StorageResult<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

// ============================================================================
// File Storage
// ============================================================================

/// One JSON file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    directory: PathBuf,
}

impl FileStorage {
    pub fn new(directory: impl AsRef<Path>) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
        }
    }

    /// Directory holding the token files
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of the file backing `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.directory.join(format!("{file_name}.json"))
    }
}

impl TokenStorage for FileStorage {
    fn read(&self, key: &str) -> StorageResult<Option<String>> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn write(&self, key: &str, value: &str) -> StorageResult<()> {
        if self.directory.exists() && !self.directory.is_dir() {
            return Err(StorageError::Unavailable(format!(
                "{} is not a directory",
                self.directory.display()
            )));
        }
        std::fs::create_dir_all(&self.directory)?;

        // Write to temp file first, then rename for atomicity
        let path = self.path_for(key);
        let temp_path = path.with_extension("tmp");
        std::fs::write(&temp_path, value)?;
        std::fs::rename(&temp_path, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}
