//! State directory layout
//!
//! Every durable artifact lives under the hidden `.garage/` directory at
//! the root of the watched tree:
//! ```text
//! .garage/
//!   snapshot        watcher snapshot (bincode)
//!   session         background process record (bincode)
//!   config.toml     optional configuration
//!   logs/
//!     watcher.log   supervisor stdout/stderr
//!   outbox/
//!     <ulid>.json   committed change sets
//! ```

use crate::error::StoreError;
use crate::Result;
use std::path::{Path, PathBuf};

/// Name of the hidden state directory below the watched root
pub const STATE_DIR_NAME: &str = ".garage";

/// Resolved paths for one watched root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateLayout {
    root: PathBuf,
    state_dir: PathBuf,
}

impl StateLayout {
    /// Build the layout for a watched root
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let state_dir = root.join(STATE_DIR_NAME);
        Self { root, state_dir }
    }

    /// Find the watched root by walking up from `start` to the first
    /// directory that holds a `.garage/` directory
    pub fn discover(start: &Path) -> Result<Self> {
        let mut current = start.to_path_buf();

        loop {
            if current.join(STATE_DIR_NAME).is_dir() {
                return Ok(Self::new(current));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => {
                    return Err(StoreError::NotInitialised {
                        start: start.to_path_buf(),
                    })
                }
            }
        }
    }

    /// Create the state, log and outbox directories
    pub fn ensure(&self) -> Result<()> {
        for dir in [self.state_dir.clone(), self.logs_dir(), self.outbox_dir()] {
            std::fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.state_dir.join("snapshot")
    }

    pub fn session_path(&self) -> PathBuf {
        self.state_dir.join("session")
    }

    pub fn config_path(&self) -> PathBuf {
        self.state_dir.join("config.toml")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.state_dir.join("logs")
    }

    pub fn log_path(&self) -> PathBuf {
        self.logs_dir().join("watcher.log")
    }

    pub fn outbox_dir(&self) -> PathBuf {
        self.state_dir.join("outbox")
    }

    /// Check whether `path` is the state directory or lies below it
    ///
    /// Relative paths are interpreted against the watched root.
    pub fn is_state_path(&self, path: &Path) -> bool {
        if path.is_absolute() {
            path.starts_with(&self.state_dir)
        } else {
            path.starts_with(STATE_DIR_NAME)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_paths_live_under_state_dir() {
        let layout = StateLayout::new("/work/project");

        assert_eq!(layout.state_dir(), Path::new("/work/project/.garage"));
        assert_eq!(layout.snapshot_path(), Path::new("/work/project/.garage/snapshot"));
        assert_eq!(layout.session_path(), Path::new("/work/project/.garage/session"));
        assert_eq!(layout.log_path(), Path::new("/work/project/.garage/logs/watcher.log"));
    }

    #[test]
    fn test_is_state_path() {
        let layout = StateLayout::new("/work/project");

        assert!(layout.is_state_path(Path::new("/work/project/.garage")));
        assert!(layout.is_state_path(Path::new("/work/project/.garage/snapshot")));
        assert!(layout.is_state_path(Path::new(".garage/session")));
        assert!(!layout.is_state_path(Path::new("/work/project/src/.garage-notes")));
        assert!(!layout.is_state_path(Path::new("/work/project/src/main.rs")));
    }

    #[test]
    fn test_discover_walks_up() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        std::fs::create_dir_all(root.join(".garage")).unwrap();
        std::fs::create_dir_all(root.join("a/b/c")).unwrap();

        let layout = StateLayout::discover(&root.join("a/b/c")).unwrap();
        assert_eq!(layout.root(), root);
    }

    #[test]
    fn test_discover_without_state_dir_fails() {
        let temp_dir = TempDir::new().unwrap();

        let err = StateLayout::discover(temp_dir.path()).unwrap_err();
        assert!(matches!(err, StoreError::NotInitialised { .. }));
    }

    #[test]
    fn test_ensure_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let layout = StateLayout::new(temp_dir.path());

        layout.ensure().unwrap();

        assert!(layout.state_dir().is_dir());
        assert!(layout.logs_dir().is_dir());
        assert!(layout.outbox_dir().is_dir());
    }
}
