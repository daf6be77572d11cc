//! The host application's in-memory dataset, as seen by the sync session.

use std::sync::RwLock;

use serde_json::Value;

use crate::error::{Result, SyncClientError};

/// Host-owned data pushed by `save` and replaced by `load`.
pub trait LocalDataset: Send + Sync {
    /// Current payload to upload.
    fn snapshot(&self) -> Result<Value>;

    /// Swap in a payload received from the server. The host refreshes its views here.
    fn replace(&self, data: Value) -> Result<()>;

    /// Persist to the host's own local storage.
    fn persist_locally(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryDataset {
    data: RwLock<Value>,
}

impl InMemoryDataset {
    pub fn new(data: Value) -> Self {
        Self {
            data: RwLock::new(data),
        }
    }
}

impl LocalDataset for InMemoryDataset {
    fn snapshot(&self) -> Result<Value> {
        self.data
            .read()
            .map(|data| data.clone())
            .map_err(|_| SyncClientError::dataset("Dataset lock poisoned"))
    }

    fn replace(&self, data: Value) -> Result<()> {
        let mut guard = self
            .data
            .write()
            .map_err(|_| SyncClientError::dataset("Dataset lock poisoned"))?;
        *guard = data;
        Ok(())
    }
}
