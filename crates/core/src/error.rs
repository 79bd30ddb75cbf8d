//! Error types for storage and the inventory store.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used by the storage layer and the store.
pub type StoreResult<T> = Result<T, StoreError>;

/// Failures raised while reading or writing persisted inventory state.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing file could not be read or written.
    #[error("storage i/o failed for {}: {source}", path.display())]
    Io {
        /// File that was being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The value stored under a key is not a valid item list.
    #[error("stored value under `{key}` is malformed: {source}")]
    Malformed {
        /// Storage key that held the bad payload.
        key: String,
        /// Parse failure.
        #[source]
        source: serde_json::Error,
    },

    /// The in-memory collection could not be encoded.
    #[error("failed to serialize inventory: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
