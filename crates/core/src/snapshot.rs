//! Snapshot model: watched directories, baseline files and pending changes

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::Metadata;
use std::path::Path;

/// A not-yet-committed change to a single path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Change {
    /// Path appeared since the last commit
    Created,
    /// Path disappeared since the last commit
    Deleted,
    /// Baseline file was rewritten; carries the new modification timestamp
    Modified(String),
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Change::Created => f.write_str("create"),
            Change::Deleted => f.write_str("delete"),
            Change::Modified(stamp) => f.write_str(stamp),
        }
    }
}

/// Durable record of the watched tree
///
/// Owned by exactly one supervisor while it runs. Readers outside the
/// supervisor work on a copy loaded from disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Watched root; fixed at bootstrap
    root: String,
    /// Watched directories, root first, no duplicates
    directories: Vec<String>,
    /// Baseline files with their modification timestamps
    known_files: BTreeMap<String, String>,
    /// Delta since the last commit
    pending_changes: BTreeMap<String, Change>,
}

impl Snapshot {
    /// Create an empty snapshot whose only watched directory is the root
    pub fn new(root: &Path) -> Self {
        let root = path_key(root);
        Self {
            directories: vec![root.clone()],
            root,
            known_files: BTreeMap::new(),
            pending_changes: BTreeMap::new(),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn directories(&self) -> &[String] {
        &self.directories
    }

    pub fn known_files(&self) -> &BTreeMap<String, String> {
        &self.known_files
    }

    pub fn pending_changes(&self) -> &BTreeMap<String, Change> {
        &self.pending_changes
    }

    pub fn is_directory(&self, path: &str) -> bool {
        self.directories.iter().any(|d| d == path)
    }

    pub fn is_known_file(&self, path: &str) -> bool {
        self.known_files.contains_key(path)
    }

    /// Append a watched directory; returns false if it was already present
    pub fn add_directory(&mut self, path: String) -> bool {
        if self.is_directory(&path) {
            return false;
        }
        self.directories.push(path);
        true
    }

    /// Remove a watched directory; returns false if it was not present
    pub fn remove_directory(&mut self, path: &str) -> bool {
        match self.directories.iter().position(|d| d == path) {
            Some(idx) => {
                self.directories.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Record a baseline file (bootstrap only)
    pub fn insert_known_file(&mut self, path: String, stamp: String) {
        self.known_files.insert(path, stamp);
    }

    /// Record that a file appeared
    ///
    /// A baseline file that reappears (recreated after a delete, or
    /// replaced by a rename over it) is a modification relative to the
    /// baseline, never a creation.
    pub fn mark_created(&mut self, path: String, stamp: String) {
        let change = if self.known_files.contains_key(&path) {
            Change::Modified(stamp)
        } else {
            Change::Created
        };
        self.pending_changes.insert(path, change);
    }

    /// Record that a file disappeared
    ///
    /// Removing a file created since the last commit cancels the pending
    /// creation. Returns the change now pending for the path, if any.
    pub fn mark_removed(&mut self, path: String) -> Option<&Change> {
        if self.pending_changes.get(&path) == Some(&Change::Created) {
            self.pending_changes.remove(&path);
            return None;
        }
        self.pending_changes.insert(path.clone(), Change::Deleted);
        self.pending_changes.get(&path)
    }

    /// Record a rewrite of a baseline file
    ///
    /// Returns false when the path is not a baseline file or is already
    /// pending as a creation.
    pub fn mark_modified(&mut self, path: String, stamp: String) -> bool {
        if !self.known_files.contains_key(&path) {
            return false;
        }
        if self.pending_changes.get(&path) == Some(&Change::Created) {
            return false;
        }
        self.pending_changes.insert(path, Change::Modified(stamp));
        true
    }
}

/// Key under which a path is stored in a snapshot
///
/// Non-UTF-8 components are replaced lossily.
pub fn path_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Render a file's modification time as an RFC 3339 UTC string
///
/// The fixed-width nanosecond format sorts lexicographically in time order.
pub fn modified_stamp(metadata: &Metadata) -> std::io::Result<String> {
    let modified: DateTime<Utc> = metadata.modified()?.into();
    Ok(modified.to_rfc3339_opts(SecondsFormat::Nanos, true))
}
