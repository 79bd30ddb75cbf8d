//! Key-value storage backends for persisted inventory state.

use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use parking_lot::RwLock;
use tracing::debug;

use crate::error::{StoreError, StoreResult};

/// Directory under the user's data dir used by [`FileStorage::default_root`].
pub const DEFAULT_STORAGE_DIR: &str = "gridbag";

/// String-keyed storage holding whole serialized values.
///
/// Writes replace the previous value for a key wholesale.
pub trait KeyValueStorage {
    /// Fetch the value under `key`, or `None` if nothing was stored.
    fn get_item(&self, key: &str) -> StoreResult<Option<String>>;

    /// Store `value` under `key`, overwriting any previous value.
    fn set_item(&mut self, key: &str, value: &str) -> StoreResult<()>;

    /// Drop the value under `key`. Missing keys are ignored.
    fn remove_item(&mut self, key: &str) -> StoreResult<()>;
}

/// In-memory storage. Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Whether nothing has been stored yet.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.inner.read().get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> StoreResult<()> {
        self.inner.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> StoreResult<()> {
        self.inner.write().remove(key);
        Ok(())
    }
}

/// Storage that keeps one JSON file per key inside a root directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Create storage rooted at the provided directory. Nothing is created until the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Default location under the user's data directory.
    pub fn default_root() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_STORAGE_DIR)
    }

    /// Root directory holding the key files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing the given key.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", sanitize_key(key)))
    }
}

impl KeyValueStorage for FileStorage {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StoreError::io(path, err)),
        }
    }

    fn set_item(&mut self, key: &str, value: &str) -> StoreResult<()> {
        fs::create_dir_all(&self.root).map_err(|err| StoreError::io(&self.root, err))?;
        let path = self.path_for(key);
        fs::write(&path, value).map_err(|err| StoreError::io(&path, err))?;
        debug!(path = %path.display(), bytes = value.len(), "storage write");
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> StoreResult<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StoreError::io(path, err)),
        }
    }
}

fn sanitize_key(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_') {
            result.push(ch);
        }
    }
    if result.is_empty() {
        "storage".to_string()
    } else {
        result
    }
}
