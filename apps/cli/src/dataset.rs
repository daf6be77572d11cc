//! JSON file standing in for the host application's local storage.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use log::debug;
use serde_json::{json, Value};
use uuid::Uuid;

use liftsync_sync_client::{LocalDataset, Result, SyncClientError};

#[derive(Debug)]
pub struct FileDataset {
    path: PathBuf,
    data: RwLock<Value>,
}

fn write_atomic(path: &Path, value: &Value) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;
    let content = serde_json::to_string_pretty(value)?;
    let tmp_path = dir.join(format!(".liftsync-{}.tmp", Uuid::new_v4()));
    let result = fs::write(&tmp_path, content).and_then(|_| fs::rename(&tmp_path, path));
    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

/// `None` when the file does not exist.
fn read_file(path: &Path) -> Result<Option<Value>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(SyncClientError::dataset(format!(
                "Failed to read {}: {}",
                path.display(),
                err
            )))
        }
    };
    serde_json::from_str(&content).map(Some).map_err(|e| {
        SyncClientError::dataset(format!("{} is not valid JSON: {}", path.display(), e))
    })
}

impl FileDataset {
    /// Open `path`; a missing file is an empty object.
    pub fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let data = read_file(&path)?.unwrap_or_else(|| json!({}));
        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    fn current(&self) -> Result<Value> {
        self.data
            .read()
            .map(|data| data.clone())
            .map_err(|_| SyncClientError::dataset("Dataset lock poisoned"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Swap the in-memory copy without touching the file.
    pub fn set(&self, data: Value) -> Result<()> {
        let mut guard = self
            .data
            .write()
            .map_err(|_| SyncClientError::dataset("Dataset lock poisoned"))?;
        *guard = data;
        Ok(())
    }
}

impl LocalDataset for FileDataset {
    /// Re-reads the file so edits made while watching are pushed.
    fn snapshot(&self) -> Result<Value> {
        match read_file(&self.path)? {
            Some(data) => {
                self.set(data.clone())?;
                Ok(data)
            }
            None => self.current(),
        }
    }

    fn replace(&self, data: Value) -> Result<()> {
        self.set(data)?;
        self.persist_locally()
    }

    fn persist_locally(&self) -> Result<()> {
        let data = self.current()?;
        write_atomic(&self.path, &data).map_err(|e| {
            SyncClientError::dataset(format!("Failed to write {}: {}", self.path.display(), e))
        })?;
        debug!("[Sync] Wrote local dataset to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_opens_as_empty_object() {
        let dir = tempdir().unwrap();
        let dataset = FileDataset::open(dir.path().join("data.json")).unwrap();
        assert_eq!(dataset.snapshot().unwrap(), json!({}));
        assert!(!dataset.path().exists());
    }

    #[test]
    fn replace_persists_to_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("data.json");
        let dataset = FileDataset::open(&path).unwrap();

        dataset.replace(json!({"Squat": {"sessions": [{}]}})).unwrap();

        let reopened = FileDataset::open(&path).unwrap();
        assert_eq!(
            reopened.snapshot().unwrap(),
            json!({"Squat": {"sessions": [{}]}})
        );
        let leftovers = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn set_does_not_write_until_persisted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        let dataset = FileDataset::open(&path).unwrap();

        dataset.set(json!({"a": 1})).unwrap();
        assert!(!path.exists());

        dataset.persist_locally().unwrap();
        assert_eq!(
            serde_json::from_str::<Value>(&fs::read_to_string(&path).unwrap()).unwrap(),
            json!({"a": 1})
        );
    }

    #[test]
    fn snapshot_picks_up_edits_made_on_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, r#"{"Squat": {"sessions": []}}"#).unwrap();
        let dataset = FileDataset::open(&path).unwrap();

        fs::write(&path, r#"{"Squat": {"sessions": [{"date": "2024-02-01"}]}}"#).unwrap();

        assert_eq!(
            dataset.snapshot().unwrap(),
            json!({"Squat": {"sessions": [{"date": "2024-02-01"}]}})
        );
    }

    #[test]
    fn persist_writes_the_imported_copy_not_the_old_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, r#"{"old": true}"#).unwrap();
        let dataset = FileDataset::open(&path).unwrap();

        dataset.set(json!({"imported": true})).unwrap();
        dataset.persist_locally().unwrap();

        assert_eq!(dataset.snapshot().unwrap(), json!({"imported": true}));
    }

    #[test]
    fn invalid_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, "nope").unwrap();
        assert!(FileDataset::open(&path).is_err());
    }
}
