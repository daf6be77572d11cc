use async_trait::async_trait;
use serde_json::Value;

use super::{Document, UserRecord};
use crate::errors::Result;

/// A retained copy of the document taken before an overwrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupEntry {
    pub file_name: String,
    pub path: std::path::PathBuf,
    pub modified: std::time::SystemTime,
}

/// Persistence contract for the synced document.
#[async_trait]
pub trait DocumentRepositoryTrait: Send + Sync {
    /// Read the document, seeding a default one when nothing has been stored yet.
    async fn load_document(&self) -> Result<Document>;

    /// Back up the current document then replace it. `Ok(false)` when the final write failed.
    async fn save_document(&self, document: Document) -> Result<bool>;

    /// Replace one user's record with `data` stamped with the current time.
    async fn upsert_user_record(&self, user_id: &str, data: Value) -> Result<UserRecord>;

    /// Retained backups, oldest first.
    async fn list_backups(&self) -> Result<Vec<BackupEntry>>;
}
