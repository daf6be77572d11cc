//! Backup naming, listing and rotation.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use log::{debug, warn};

use liftsync_core::documents::BackupEntry;

/// Backups retained after every save.
pub const MAX_BACKUPS: usize = 10;

const BACKUP_PREFIX: &str = "backup_";
const BACKUP_SUFFIX: &str = ".json";
const BACKUP_STAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";
const BACKUP_STAMP_LEN: usize = 19;

pub(crate) fn backup_file_name(at: DateTime<Utc>, sequence: u32) -> String {
    let stamp = at.format(BACKUP_STAMP_FORMAT);
    if sequence == 0 {
        format!("{BACKUP_PREFIX}{stamp}{BACKUP_SUFFIX}")
    } else {
        format!("{BACKUP_PREFIX}{stamp}_{sequence}{BACKUP_SUFFIX}")
    }
}

/// First unused backup path for `at`. Saves within the same second get a `_<n>` suffix.
pub(crate) fn next_backup_path(dir: &Path, at: DateTime<Utc>) -> PathBuf {
    let mut sequence = 0;
    loop {
        let candidate = dir.join(backup_file_name(at, sequence));
        if !candidate.exists() {
            return candidate;
        }
        sequence += 1;
    }
}

/// Returns `(stamp, sequence)` for names produced by [`backup_file_name`].
fn parse_backup_name(name: &str) -> Option<(NaiveDateTime, u32)> {
    let stem = name.strip_prefix(BACKUP_PREFIX)?.strip_suffix(BACKUP_SUFFIX)?;
    if stem.len() < BACKUP_STAMP_LEN || !stem.is_char_boundary(BACKUP_STAMP_LEN) {
        return None;
    }
    let (stamp, rest) = stem.split_at(BACKUP_STAMP_LEN);
    let stamp = NaiveDateTime::parse_from_str(stamp, BACKUP_STAMP_FORMAT).ok()?;
    let sequence = if rest.is_empty() {
        0
    } else {
        rest.strip_prefix('_')?.parse().ok()?
    };
    Some((stamp, sequence))
}

/// List backups in `dir`, oldest first.
///
/// Ordered by modification time; ties fall back to the timestamp and sequence
/// encoded in the file name. Files that don't look like backups are ignored.
pub fn list_backups(dir: &Path) -> io::Result<Vec<BackupEntry>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err),
    };

    let mut backups = Vec::new();
    for entry in entries {
        let entry = entry?;
        let Ok(file_name) = entry.file_name().into_string() else {
            continue;
        };
        let Some(name_key) = parse_backup_name(&file_name) else {
            continue;
        };
        let metadata = entry.metadata()?;
        if !metadata.is_file() {
            continue;
        }
        let modified = metadata.modified()?;
        backups.push((
            modified,
            name_key,
            BackupEntry {
                file_name,
                path: entry.path(),
                modified,
            },
        ));
    }

    backups.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
    Ok(backups.into_iter().map(|(_, _, entry)| entry).collect())
}

/// Delete the oldest backups so that at most `keep` remain.
pub(crate) fn prune_backups(dir: &Path, keep: usize) -> io::Result<usize> {
    let backups = list_backups(dir)?;
    if backups.len() <= keep {
        return Ok(0);
    }

    let excess = backups.len() - keep;
    let mut removed = 0;
    for backup in backups.into_iter().take(excess) {
        match fs::remove_file(&backup.path) {
            Ok(()) => {
                removed += 1;
                debug!("[Storage] Pruned backup {}", backup.file_name);
            }
            Err(err) => warn!(
                "[Storage] Failed to prune backup {}: {}",
                backup.file_name, err
            ),
        }
    }
    Ok(removed)
}
