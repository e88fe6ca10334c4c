//! Diff engine: folds notifications into the snapshot
//!
//! The engine is the only code that mutates a live snapshot. It performs
//! no I/O besides stat-ing the notified path through [`Inspect`], which
//! keeps the classification rules testable without a real file system.

use crate::ignore::IgnoreRules;
use crate::notification::Notification;
use crate::{Result, WatchError};
use garage_core::{modified_stamp, path_key, Snapshot};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace};

/// What a notified path turned out to be
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathInfo {
    Directory,
    File { modified: String },
}

/// Stat access used by the engine
pub trait Inspect {
    fn stat(&self, path: &Path) -> io::Result<PathInfo>;
}

/// [`Inspect`] backed by the real file system
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemInspector;

impl Inspect for SystemInspector {
    fn stat(&self, path: &Path) -> io::Result<PathInfo> {
        let metadata = std::fs::metadata(path)?;
        if metadata.is_dir() {
            Ok(PathInfo::Directory)
        } else {
            Ok(PathInfo::File {
                modified: modified_stamp(&metadata)?,
            })
        }
    }
}

/// Effect of a single notification on the snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing changed
    Unchanged,
    /// The pending change set was updated
    Recorded,
    /// A new directory joined the watch list; the caller must register it
    WatchDirectory(PathBuf),
    /// A watched directory was dropped from the watch list
    DirectoryRemoved(PathBuf),
}

pub struct DiffEngine<I = SystemInspector> {
    rules: IgnoreRules,
    inspect: I,
}

impl DiffEngine<SystemInspector> {
    pub fn new(rules: IgnoreRules) -> Self {
        Self::with_inspector(rules, SystemInspector)
    }
}

impl<I: Inspect> DiffEngine<I> {
    pub fn with_inspector(rules: IgnoreRules, inspect: I) -> Self {
        Self { rules, inspect }
    }

    /// Apply one notification to `snapshot`
    ///
    /// A path that cannot be stat-ed any more yields
    /// [`WatchError::Vanished`]; the snapshot is left untouched in that case.
    pub fn apply(&mut self, snapshot: &mut Snapshot, notification: &Notification) -> Result<Outcome> {
        let outcome = match notification {
            Notification::Created(path) => self.created(snapshot, path)?,
            Notification::Removed { path, directory } => self.removed(snapshot, path, *directory)?,
            Notification::Modified(path) => self.modified(snapshot, path)?,
        };

        if notification.path() == &self.rules.ignore_file_path() {
            self.rules.reload()?;
            info!(sources = self.rules.active_sources(), "Reloaded ignore rules");
        }

        Ok(outcome)
    }

    fn created(&self, snapshot: &mut Snapshot, path: &Path) -> Result<Outcome> {
        if self.rules.should_ignore(path, false) {
            trace!(path = %path.display(), "Ignoring creation");
            return Ok(Outcome::Unchanged);
        }

        match self.stat(path)? {
            PathInfo::Directory => {
                if self.rules.should_ignore(path, true) {
                    trace!(path = %path.display(), "Ignoring new directory");
                    return Ok(Outcome::Unchanged);
                }
                if snapshot.add_directory(path_key(path)) {
                    debug!(path = %path.display(), "Directory created");
                    Ok(Outcome::WatchDirectory(path.to_path_buf()))
                } else {
                    Ok(Outcome::Unchanged)
                }
            }
            PathInfo::File { modified } => {
                snapshot.mark_created(path_key(path), modified);
                debug!(path = %path.display(), "File created");
                Ok(Outcome::Recorded)
            }
        }
    }

    fn removed(&self, snapshot: &mut Snapshot, path: &Path, directory: bool) -> Result<Outcome> {
        let key = path_key(path);

        // The root stays in the watch list; losing it ends the run
        if key == snapshot.root() {
            return Err(WatchError::Vanished {
                path: path.to_path_buf(),
                source: io::Error::from(io::ErrorKind::NotFound),
            });
        }

        if directory || snapshot.is_directory(&key) {
            if snapshot.remove_directory(&key) {
                debug!(path = %path.display(), "Directory removed");
                return Ok(Outcome::DirectoryRemoved(path.to_path_buf()));
            }
            return Ok(Outcome::Unchanged);
        }

        if self.rules.should_ignore(path, false) {
            trace!(path = %path.display(), "Ignoring removal");
            return Ok(Outcome::Unchanged);
        }

        match snapshot.mark_removed(key) {
            Some(change) => debug!(path = %path.display(), %change, "File removed"),
            None => debug!(path = %path.display(), "Pending creation cancelled"),
        }
        Ok(Outcome::Recorded)
    }

    fn modified(&self, snapshot: &mut Snapshot, path: &Path) -> Result<Outcome> {
        let key = path_key(path);

        // Only baseline files are tracked by writes; new files were
        // already recorded by their creation.
        if !snapshot.is_known_file(&key) || self.rules.should_ignore(path, false) {
            return Ok(Outcome::Unchanged);
        }

        match self.stat(path)? {
            PathInfo::Directory => Ok(Outcome::Unchanged),
            PathInfo::File { modified } => {
                if snapshot.mark_modified(key, modified) {
                    debug!(path = %path.display(), "File modified");
                    Ok(Outcome::Recorded)
                } else {
                    Ok(Outcome::Unchanged)
                }
            }
        }
    }

    fn stat(&self, path: &Path) -> Result<PathInfo> {
        self.inspect.stat(path).map_err(|source| WatchError::Vanished {
            path: path.to_path_buf(),
            source,
        })
    }
}
