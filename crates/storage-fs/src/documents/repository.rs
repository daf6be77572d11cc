use async_trait::async_trait;
use log::{debug, error};
use serde_json::Value;
use tokio::sync::Mutex;

use liftsync_core::documents::{BackupEntry, Document, DocumentRepositoryTrait, UserRecord};
use liftsync_core::{Error, Result};

use super::store::DocumentFileStore;
use crate::errors::StorageError;

/// Async repository over [`DocumentFileStore`].
///
/// Every operation holds one write lock, so a load-modify-save for one user
/// never interleaves with another and both records survive.
#[derive(Debug)]
pub struct DocumentRepository {
    store: DocumentFileStore,
    write_lock: Mutex<()>,
}

impl DocumentRepository {
    pub fn new(store: DocumentFileStore) -> Self {
        DocumentRepository {
            store,
            write_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &DocumentFileStore {
        &self.store
    }

    async fn run_blocking<T, F>(&self, job: F) -> Result<T>
    where
        F: FnOnce(DocumentFileStore) -> std::result::Result<T, StorageError> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.store.clone();
        let outcome = tokio::task::spawn_blocking(move || job(store))
            .await
            .map_err(|e| StorageError::Task(e.to_string()))?;
        Ok(outcome?)
    }
}

#[async_trait]
impl DocumentRepositoryTrait for DocumentRepository {
    async fn load_document(&self) -> Result<Document> {
        let _guard = self.write_lock.lock().await;
        self.run_blocking(|store| store.load()).await
    }

    async fn save_document(&self, document: Document) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        self.run_blocking(move |store| store.save(&document)).await
    }

    async fn upsert_user_record(&self, user_id: &str, data: Value) -> Result<UserRecord> {
        if user_id.trim().is_empty() {
            return Err(Error::validation("User id must not be empty"));
        }

        let _guard = self.write_lock.lock().await;
        let user = user_id.to_string();
        let saved = self
            .run_blocking(move |store| {
                let mut document = store.load()?;
                let record = UserRecord::new(data, store.now());
                document.replace_user(&user, record.clone());
                Ok(store.save(&document)?.then_some(record))
            })
            .await?;

        match saved {
            Some(record) => {
                debug!(
                    "[Storage] Saved record for user '{}' at {}",
                    user_id, record.last_update
                );
                Ok(record)
            }
            None => {
                error!("[Storage] Document write failed for user '{}'", user_id);
                Err(Error::storage("Failed to write document"))
            }
        }
    }

    async fn list_backups(&self) -> Result<Vec<BackupEntry>> {
        self.run_blocking(|store| store.list_backups()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::store::tests::SteppingClock;
    use crate::MAX_BACKUPS;
    use liftsync_core::documents::DEFAULT_USER_ID;
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn repository(dir: &std::path::Path) -> DocumentRepository {
        DocumentRepository::new(DocumentFileStore::with_clock(
            dir,
            Arc::new(SteppingClock::new()),
        ))
    }

    #[tokio::test]
    async fn upsert_then_load_round_trips_payload() {
        let dir = tempdir().unwrap();
        let repo = repository(dir.path());

        let seeded = repo.load_document().await.unwrap();
        let seed_time = seeded.users[DEFAULT_USER_ID].last_update.clone();

        let payload = json!({"Panca": {"sessions": [{"date": "2024-01-01"}]}});
        let record = repo
            .upsert_user_record(DEFAULT_USER_ID, payload.clone())
            .await
            .unwrap();

        let loaded = repo.load_document().await.unwrap();
        let stored = loaded.user(DEFAULT_USER_ID).unwrap();
        assert_eq!(stored.data, payload);
        assert_eq!(stored.last_update, record.last_update);
        assert!(stored.last_update > seed_time);
    }

    #[tokio::test]
    async fn upsert_keeps_other_users() {
        let dir = tempdir().unwrap();
        let repo = repository(dir.path());

        repo.upsert_user_record("anna", json!({"a": 1}))
            .await
            .unwrap();
        repo.upsert_user_record("marco", json!({"m": 2}))
            .await
            .unwrap();

        let doc = repo.load_document().await.unwrap();
        assert_eq!(doc.users["anna"].data, json!({"a": 1}));
        assert_eq!(doc.users["marco"].data, json!({"m": 2}));
        assert!(doc.user(DEFAULT_USER_ID).is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_upserts_for_different_users_all_survive() {
        let dir = tempdir().unwrap();
        let repo = Arc::new(repository(dir.path()));

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let repo = Arc::clone(&repo);
                tokio::spawn(async move {
                    repo.upsert_user_record(&format!("user-{i}"), json!({"i": i}))
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let doc = repo.load_document().await.unwrap();
        for i in 0..16 {
            assert_eq!(doc.users[&format!("user-{i}")].data, json!({"i": i}));
        }
        assert_eq!(
            repo.list_backups().await.unwrap().len(),
            MAX_BACKUPS
        );
    }

    #[tokio::test]
    async fn corrupt_document_blocks_upsert_without_overwriting() {
        let dir = tempdir().unwrap();
        let repo = repository(dir.path());
        let path = repo.store().document_path();
        std::fs::write(&path, "{\"users\": ").unwrap();

        let err = repo
            .upsert_user_record(DEFAULT_USER_ID, json!({}))
            .await
            .unwrap_err();
        assert!(err.is_corrupt_data());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\"users\": ");
    }

    #[tokio::test]
    async fn empty_user_id_is_rejected() {
        let dir = tempdir().unwrap();
        let repo = repository(dir.path());

        let err = repo.upsert_user_record("  ", json!({})).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(!repo.store().document_path().exists());
    }
}
