use std::path::PathBuf;

use liftsync_core::Error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Document at {} is not valid: {}", .path.display(), .source)]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage task failed: {0}")]
    Task(String),
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Corrupt { .. } => Error::CorruptData(err.to_string()),
            other => Error::Storage(other.to_string()),
        }
    }
}
