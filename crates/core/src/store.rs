//! On-disk snapshot store

use crate::error::StoreError;
use crate::snapshot::Snapshot;
use crate::Result;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Result of loading the persisted snapshot
#[derive(Debug)]
pub enum LoadOutcome {
    /// A snapshot from a previous run was found
    Existing(Snapshot),
    /// Nothing was persisted; the empty snapshot must be bootstrapped
    Fresh(Snapshot),
}

impl LoadOutcome {
    pub fn needs_bootstrap(&self) -> bool {
        matches!(self, LoadOutcome::Fresh(_))
    }

    pub fn into_snapshot(self) -> Snapshot {
        match self {
            LoadOutcome::Existing(s) | LoadOutcome::Fresh(s) => s,
        }
    }
}

/// Reads and writes the single snapshot record
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the persisted snapshot, or an empty one seeded with `root`
    ///
    /// A record that exists but cannot be decoded is fatal; no partial
    /// recovery is attempted.
    pub fn load(&self, root: &Path) -> Result<LoadOutcome> {
        match self.read()? {
            Some(snapshot) => Ok(LoadOutcome::Existing(snapshot)),
            None => Ok(LoadOutcome::Fresh(Snapshot::new(root))),
        }
    }

    /// Read the persisted snapshot if there is one
    pub fn read(&self) -> Result<Option<Snapshot>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };

        let snapshot = bincode::deserialize(&bytes).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        Ok(Some(snapshot))
    }

    /// Replace the persisted record with `snapshot`
    pub fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let bytes = bincode::serialize(snapshot).map_err(StoreError::Encode)?;
        atomic_write(&self.path, &bytes)?;
        debug!(path = %self.path.display(), bytes = bytes.len(), "Snapshot saved");
        Ok(())
    }

    /// Remove the persisted record; a missing record is not an error
    pub fn discard(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(&self.path, e)),
        }
    }
}

/// Atomic write helper
///
/// Writes data to a temporary file next to the target, fsyncs it, then
/// renames it over the target. Readers see either the old or the new
/// content, never a torn record.
pub fn atomic_write(target: &Path, data: &[u8]) -> Result<()> {
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
    tmp.write_all(data).map_err(|e| StoreError::io(tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| StoreError::io(tmp.path(), e))?;
    tmp.persist(target)
        .map_err(|e| StoreError::io(target, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::Change;
    use tempfile::TempDir;

    fn sample_snapshot() -> Snapshot {
        let mut snapshot = Snapshot::new(Path::new("/w"));
        snapshot.add_directory("/w/src".to_string());
        snapshot.insert_known_file("/w/src/lib.rs".to_string(), "2024-01-01T00:00:00.000000000Z".to_string());
        snapshot.insert_known_file("/w/README".to_string(), "2024-01-02T00:00:00.000000000Z".to_string());
        snapshot.mark_created("/w/src/new.rs".to_string(), "t".to_string());
        snapshot.mark_removed("/w/gone.txt".to_string());
        snapshot.mark_modified("/w/README".to_string(), "2024-02-01T00:00:00.000000000Z".to_string());
        snapshot
    }

    #[test]
    fn test_load_without_record_needs_bootstrap() {
        let temp_dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(temp_dir.path().join("snapshot"));

        let outcome = store.load(Path::new("/w")).unwrap();

        assert!(outcome.needs_bootstrap());
        assert_eq!(outcome.into_snapshot(), Snapshot::new(Path::new("/w")));
    }

    #[test]
    fn test_save_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(temp_dir.path().join("snapshot"));
        let original = sample_snapshot();

        store.save(&original).unwrap();
        let loaded = store.load(Path::new("/elsewhere")).unwrap();
        assert!(!loaded.needs_bootstrap());
        let loaded = loaded.into_snapshot();
        assert_eq!(loaded, original);

        // Saving what was loaded produces the same record
        let first = std::fs::read(store.path()).unwrap();
        store.save(&loaded).unwrap();
        assert_eq!(std::fs::read(store.path()).unwrap(), first);
        assert_eq!(
            loaded.pending_changes().get("/w/gone.txt"),
            Some(&Change::Deleted)
        );
    }

    #[test]
    fn test_save_replaces_longer_record() {
        let temp_dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(temp_dir.path().join("snapshot"));

        store.save(&sample_snapshot()).unwrap();
        let small = Snapshot::new(Path::new("/w"));
        store.save(&small).unwrap();

        assert_eq!(store.read().unwrap(), Some(small));
    }

    #[test]
    fn test_corrupt_record_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(temp_dir.path().join("snapshot"));
        std::fs::write(store.path(), b"abc").unwrap();

        let err = store.load(Path::new("/w")).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn test_discard_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(temp_dir.path().join("snapshot"));
        store.save(&sample_snapshot()).unwrap();

        store.discard().unwrap();
        assert!(!store.exists());
        store.discard().unwrap();
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("state/record");

        atomic_write(&target, b"hello").unwrap();
        atomic_write(&target, b"hi").unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), b"hi");
        let entries: Vec<_> = std::fs::read_dir(temp_dir.path().join("state"))
            .unwrap()
            .collect();
        assert_eq!(entries.len(), 1);
    }
}
