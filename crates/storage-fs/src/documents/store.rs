//! Synchronous file store for the synced document.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, error, info};
use uuid::Uuid;

use liftsync_core::clock::{Clock, SystemClock};
use liftsync_core::documents::{BackupEntry, Document};

use super::backups::{list_backups, next_backup_path, prune_backups, MAX_BACKUPS};
use crate::errors::StorageError;

pub const DOCUMENT_FILE_NAME: &str = "user_data.json";
pub const BACKUP_DIR_NAME: &str = "backups";

/// Primary document file plus a directory of rolling backups, under one data dir.
#[derive(Clone)]
pub struct DocumentFileStore {
    data_dir: PathBuf,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for DocumentFileStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentFileStore")
            .field("data_dir", &self.data_dir)
            .finish_non_exhaustive()
    }
}

impl DocumentFileStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self::with_clock(data_dir, Arc::new(SystemClock))
    }

    pub fn with_clock(data_dir: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            data_dir: data_dir.into(),
            clock,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn document_path(&self) -> PathBuf {
        self.data_dir.join(DOCUMENT_FILE_NAME)
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.data_dir.join(BACKUP_DIR_NAME)
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Read the document.
    ///
    /// A missing file is the first-run case: a default document is seeded,
    /// persisted and returned. A file that exists but does not parse is
    /// reported as [`StorageError::Corrupt`] and left untouched.
    pub fn load(&self) -> Result<Document, StorageError> {
        let path = self.document_path();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!(
                    "[Storage] No document at {}, seeding default",
                    path.display()
                );
                let document = Document::seeded(self.clock.now());
                self.ensure_dirs()?;
                self.write_atomic(&serde_json::to_string_pretty(&document)?)?;
                return Ok(document);
            }
            Err(err) => return Err(StorageError::Io(err)),
        };

        serde_json::from_str(&content).map_err(|source| {
            error!("[Storage] Document at {} is corrupt: {}", path.display(), source);
            StorageError::Corrupt { path, source }
        })
    }

    /// Back up the current file, prune old backups, then replace the document.
    ///
    /// Returns `Ok(false)` when only the final write failed; the previous
    /// document is still in place in that case.
    pub fn save(&self, document: &Document) -> Result<bool, StorageError> {
        self.ensure_dirs()?;
        let content = serde_json::to_string_pretty(document)?;

        let path = self.document_path();
        if path.exists() {
            let backup_path = next_backup_path(&self.backup_dir(), self.clock.now());
            fs::copy(&path, &backup_path)?;
            debug!("[Storage] Backed up document to {}", backup_path.display());
            prune_backups(&self.backup_dir(), MAX_BACKUPS)?;
        }

        match self.write_atomic(&content) {
            Ok(()) => Ok(true),
            Err(err) => {
                error!("[Storage] Failed to write {}: {}", path.display(), err);
                Ok(false)
            }
        }
    }

    pub fn list_backups(&self) -> Result<Vec<BackupEntry>, StorageError> {
        Ok(list_backups(&self.backup_dir())?)
    }

    fn ensure_dirs(&self) -> Result<(), StorageError> {
        fs::create_dir_all(self.backup_dir())?;
        Ok(())
    }

    /// Write to a temp file in the data dir and rename it over the document.
    fn write_atomic(&self, content: &str) -> Result<(), StorageError> {
        let tmp_path = self
            .data_dir
            .join(format!(".user_data-{}.tmp", Uuid::new_v4()));
        let result =
            fs::write(&tmp_path, content).and_then(|_| fs::rename(&tmp_path, self.document_path()));
        if let Err(err) = result {
            let _ = fs::remove_file(&tmp_path);
            return Err(StorageError::Io(err));
        }
        Ok(())
    }
}
