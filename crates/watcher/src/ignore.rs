//! Ignore pattern management for garage
//!
//! Supports multiple sources of ignore patterns:
//! 1. Built-in: the `.garage/` state directory (always active)
//! 2. `.garageignore` at the watched root (optional, enabled by default)
//! 3. Config-based patterns (additional custom patterns)

use garage_core::{StateLayout, WatcherConfig};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::{Path, PathBuf};

/// Name of the per-tree ignore file
pub const IGNORE_FILE_NAME: &str = ".garageignore";

/// Ignore rule manager
///
/// Combines the sources with a fixed precedence: the state directory is
/// always excluded, then `.garageignore`, then configured patterns.
pub struct IgnoreRules {
    /// Layout of the watched tree
    layout: StateLayout,

    /// `.garageignore` patterns (optional)
    ignore_file: Option<Gitignore>,

    /// Patterns from configuration (optional)
    configured: Option<Gitignore>,

    /// Configuration
    config: WatcherConfig,
}

impl IgnoreRules {
    /// Load ignore rules for a watched root
    pub fn load(layout: &StateLayout, config: WatcherConfig) -> Result<Self, ignore::Error> {
        let mut rules = Self {
            layout: layout.clone(),
            ignore_file: None,
            configured: None,
            config,
        };

        rules.reload()?;
        Ok(rules)
    }

    /// Rebuild matchers from `.garageignore` and the configured patterns
    pub fn reload(&mut self) -> Result<(), ignore::Error> {
        let root = self.layout.root().to_path_buf();

        self.ignore_file = None;
        if self.config.use_ignore_file {
            let path = self.ignore_file_path();
            if path.exists() {
                let mut builder = GitignoreBuilder::new(&root);
                if let Some(err) = builder.add(&path) {
                    return Err(err);
                }
                self.ignore_file = Some(builder.build()?);
            }
        }

        self.configured = None;
        if !self.config.additional_patterns.is_empty() {
            let mut builder = GitignoreBuilder::new(&root);
            for pattern in &self.config.additional_patterns {
                builder.add_line(None, pattern)?;
            }
            self.configured = Some(builder.build()?);
        }

        Ok(())
    }

    /// Location of the per-tree ignore file
    pub fn ignore_file_path(&self) -> PathBuf {
        self.layout.root().join(IGNORE_FILE_NAME)
    }

    /// Check if a path should be ignored
    ///
    /// Paths may be absolute (under the root) or relative to the root.
    /// A path inside an ignored directory is ignored as well.
    pub fn should_ignore(&self, path: &Path, is_dir: bool) -> bool {
        // 1. Built-in (always enforced)
        if self.layout.is_state_path(path) {
            return true;
        }

        if path.is_absolute() && !path.starts_with(self.layout.root()) {
            return false;
        }

        // 2. .garageignore
        if let Some(ref matcher) = self.ignore_file {
            if matcher.matched_path_or_any_parents(path, is_dir).is_ignore() {
                return true;
            }
        }

        // 3. Configured patterns
        if let Some(ref matcher) = self.configured {
            if matcher.matched_path_or_any_parents(path, is_dir).is_ignore() {
                return true;
            }
        }

        false
    }

    /// Get number of active ignore sources
    pub fn active_sources(&self) -> usize {
        let mut count = 1; // Built-in always active
        if self.ignore_file.is_some() {
            count += 1;
        }
        if self.configured.is_some() {
            count += 1;
        }
        count
    }
}
