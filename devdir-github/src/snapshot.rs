//! Snapshot persistence — JSON documents under the configured snapshot dir.
//!
//! Writes are hash-gated and atomic:
//!
//! 1. Serialize the document.
//! 2. SHA-256 hash the serialized content.
//! 3. Compare with the hash of what is already on disk → skip if identical.
//! 4. Write to `<path>.tmp`.
//! 5. Rename to the final path (atomic on POSIX).
//!
//! The skip keeps mtimes stable across no-op runs, so downstream consumers
//! watching the files see changes only when content actually changed.

use std::path::{Path, PathBuf};

use serde_json::Value;
use sha2::{Digest, Sha256};

use devdir_sync::{ProviderError, SnapshotKind, SnapshotStore};

use crate::error::io_err;

/// Outcome of a single snapshot write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// File was written (content changed or did not previously exist).
    Written,
    /// File was skipped, content matches what is on disk.
    Unchanged,
}

/// [`SnapshotStore`] backed by one JSON file per snapshot kind.
pub struct FileSnapshotStore {
    dir: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, kind: SnapshotKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn persist(&self, kind: SnapshotKind, data: &Value) -> Result<(), ProviderError> {
        let path = self.path_for(kind);
        let json = serde_json::to_string_pretty(data)
            .map_err(|e| ProviderError::decode("serialize snapshot", e))?;
        match atomic_write(&path, &json)? {
            WriteOutcome::Written => tracing::info!("wrote: {}", path.display()),
            WriteOutcome::Unchanged => tracing::debug!("unchanged: {}", path.display()),
        }
        Ok(())
    }

    fn load(&self, kind: SnapshotKind) -> Result<Option<Value>, ProviderError> {
        let path = self.path_for(kind);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        let value = serde_json::from_str(&contents)
            .map_err(|e| ProviderError::decode("parse snapshot", format!("{}: {e}", path.display())))?;
        Ok(Some(value))
    }
}

fn digest(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Atomically write `content`, skipping when the on-disk content hashes the
/// same.
fn atomic_write(path: &Path, content: &str) -> Result<WriteOutcome, ProviderError> {
    if let Ok(existing) = std::fs::read_to_string(path) {
        if digest(&existing) == digest(content) {
            return Ok(WriteOutcome::Unchanged);
        }
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
    }

    let tmp = PathBuf::from(format!("{}.tmp", path.display()));
    std::fs::write(&tmp, content).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(WriteOutcome::Written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn roundtrip_persist_load() {
        let tmp = TempDir::new().unwrap();
        let store = FileSnapshotStore::new(tmp.path());
        let data = json!({ "p1": "post-1" });

        store.persist(SnapshotKind::SocialMap, &data).unwrap();
        let loaded = store.load(SnapshotKind::SocialMap).unwrap();
        assert_eq!(loaded, Some(data));
    }

    #[test]
    fn missing_snapshot_loads_as_none() {
        let tmp = TempDir::new().unwrap();
        let store = FileSnapshotStore::new(tmp.path());
        assert_eq!(store.load(SnapshotKind::Statistics).unwrap(), None);
    }

    #[test]
    fn unchanged_content_preserves_mtime() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("statistics.json");
        let content = r#"{"tasks":{"total":3}}"#;

        assert_eq!(atomic_write(&path, content).unwrap(), WriteOutcome::Written);
        let mtime_1 = std::fs::metadata(&path).unwrap().modified().unwrap();

        std::thread::sleep(std::time::Duration::from_millis(1100));
        assert_eq!(
            atomic_write(&path, content).unwrap(),
            WriteOutcome::Unchanged
        );
        let mtime_2 = std::fs::metadata(&path).unwrap().modified().unwrap();
        assert_eq!(mtime_2, mtime_1, "mtime changed; file was rewritten");
    }

    #[test]
    fn changed_content_is_rewritten() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("tasks.json");
        atomic_write(&path, "[1]").unwrap();
        assert_eq!(atomic_write(&path, "[2]").unwrap(), WriteOutcome::Written);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[2]");
    }

    #[test]
    fn tmp_file_removed_after_write() {
        let tmp = TempDir::new().unwrap();
        let store = FileSnapshotStore::new(tmp.path());
        store.persist(SnapshotKind::Tasks, &json!([])).unwrap();
        let tmp_path = tmp.path().join("tasks.json.tmp");
        assert!(!tmp_path.exists(), ".tmp must be cleaned up");
    }

    #[test]
    fn creates_snapshot_dir_on_first_write() {
        let tmp = TempDir::new().unwrap();
        let store = FileSnapshotStore::new(tmp.path().join("nested").join("snapshots"));
        store.persist(SnapshotKind::Avatars, &json!([])).unwrap();
        assert!(tmp
            .path()
            .join("nested")
            .join("snapshots")
            .join("avatars.json")
            .exists());
    }
}
