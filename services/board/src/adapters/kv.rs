//! services/board/src/adapters/kv.rs
//!
//! String key-value backends playing the role of the browser's local storage.
//! Values are opaque strings; the record layer decides what goes in them.

use async_trait::async_trait;
use lost_found_core::ports::{PortError, PortResult};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Minimal local-storage contract: whole values addressed by key.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> PortResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> PortResult<()>;

    /// Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> PortResult<()>;
}

//=========================================================================================
// In-memory backend
//=========================================================================================

/// Process-local backend. Clones share the same contents, which lets tests
/// "restart" the board on top of what a previous instance wrote.
#[derive(Clone, Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> PortResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> PortResult<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

//=========================================================================================
// Filesystem backend
//=========================================================================================

/// Keeps each key in its own file, `<base>/<key>.json`.
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// crash mid-write leaves the previous value intact.
#[derive(Clone, Debug)]
pub struct FileKeyValueStore {
    base: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    fn path_for(&self, key: &str) -> PortResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(PortError::Unexpected(format!("Invalid storage key '{}'", key)));
        }
        Ok(self.base.join(format!("{}.json", key)))
    }
}

fn io_error(e: std::io::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)?).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(e)),
        }
    }

    async fn set(&self, key: &str, value: &str) -> PortResult<()> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.base).await.map_err(io_error)?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value).await.map_err(io_error)?;
        tokio::fs::rename(&tmp, &path).await.map_err(io_error)?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        match tokio::fs::remove_file(self.path_for(key)?).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(e)),
        }
    }
}
