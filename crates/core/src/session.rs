//! Session record shared between the CLI and the background supervisor
//!
//! The CLI writes the supervisor's process id here when it spawns one and
//! reads it back on `stop`. This file plus OS signals is the only channel
//! between the two processes.

use crate::error::StoreError;
use crate::store::atomic_write;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Persisted session state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Process id (and process group id) of the supervisor; 0 = none
    pub background_pid: i32,
    /// When the supervisor was spawned (Unix milliseconds)
    pub started_at_ms: u64,
}

impl SessionRecord {
    pub fn running(pid: i32) -> Self {
        Self {
            background_pid: pid,
            started_at_ms: current_timestamp_ms(),
        }
    }

    pub fn has_process(&self) -> bool {
        self.background_pid != 0
    }
}

/// Reads and writes the session record
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the record; a missing file means no supervisor was recorded
    pub fn load(&self) -> Result<SessionRecord> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(SessionRecord::default())
            }
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };

        bincode::deserialize(&bytes).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Rewrite the whole record
    pub fn save(&self, record: &SessionRecord) -> Result<()> {
        let bytes = bincode::serialize(record).map_err(StoreError::Encode)?;
        atomic_write(&self.path, &bytes)
    }

    /// Record that no supervisor is running
    pub fn clear(&self) -> Result<()> {
        self.save(&SessionRecord::default())
    }
}

/// Milliseconds since the Unix epoch
pub fn current_timestamp_ms() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_record_means_no_process() {
        let temp_dir = TempDir::new().unwrap();
        let store = SessionStore::new(temp_dir.path().join("session"));

        let record = store.load().unwrap();

        assert_eq!(record.background_pid, 0);
        assert!(!record.has_process());
    }

    #[test]
    fn test_save_and_clear() {
        let temp_dir = TempDir::new().unwrap();
        let store = SessionStore::new(temp_dir.path().join("session"));

        let record = SessionRecord::running(4242);
        store.save(&record).unwrap();
        assert_eq!(store.load().unwrap(), record);
        assert!(record.started_at_ms > 0);

        store.clear().unwrap();
        assert!(!store.load().unwrap().has_process());
    }

    #[test]
    fn test_record_fits_small_buffer() {
        let bytes = bincode::serialize(&SessionRecord::running(i32::MAX)).unwrap();
        assert!(bytes.len() <= 1024);
    }

    #[test]
    fn test_corrupt_record() {
        let temp_dir = TempDir::new().unwrap();
        let store = SessionStore::new(temp_dir.path().join("session"));
        std::fs::write(store.path(), b"\x01").unwrap();

        assert!(matches!(store.load(), Err(StoreError::Corrupt { .. })));
    }
}
