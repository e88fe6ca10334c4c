//! One-shot tree walk that seeds a fresh snapshot

use crate::ignore::IgnoreRules;
use crate::Result;
use garage_core::{modified_stamp, path_key, Snapshot};
use std::path::Path;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Walk `root` once and build the initial snapshot
///
/// Directories below the root are appended to the watch list and regular
/// files become baseline entries keyed by their full path. The state
/// directory and ignored paths are pruned from the walk. Any walk error
/// aborts the bootstrap; nothing partial is returned.
pub fn bootstrap(root: &Path, rules: &IgnoreRules) -> Result<Snapshot> {
    let mut snapshot = Snapshot::new(root);

    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !rules.should_ignore(e.path(), e.file_type().is_dir()))
    {
        let entry = entry?;

        if entry.depth() == 0 {
            continue;
        }

        let file_type = entry.file_type();
        if file_type.is_dir() {
            snapshot.add_directory(path_key(entry.path()));
        } else if file_type.is_file() {
            let metadata = entry.metadata()?;
            let stamp = modified_stamp(&metadata).map_err(|source| crate::WatchError::Vanished {
                path: entry.path().to_path_buf(),
                source,
            })?;
            snapshot.insert_known_file(path_key(entry.path()), stamp);
        } else {
            debug!(path = %entry.path().display(), "Skipping non-regular entry");
        }
    }

    info!(
        root = %root.display(),
        directories = snapshot.directories().len(),
        files = snapshot.known_files().len(),
        "Bootstrap complete"
    );

    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use garage_core::{StateLayout, WatcherConfig};
    use std::fs;
    use tempfile::TempDir;

    fn rules_for(root: &Path, patterns: &[&str]) -> IgnoreRules {
        let config = WatcherConfig {
            use_ignore_file: true,
            additional_patterns: patterns.iter().map(|p| p.to_string()).collect(),
        };
        IgnoreRules::load(&StateLayout::new(root), config).unwrap()
    }

    #[test]
    fn test_bootstrap_collects_directories_and_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("A");
        fs::create_dir_all(root.join("B")).unwrap();
        fs::write(root.join("f.txt"), b"hello").unwrap();

        let snapshot = bootstrap(&root, &rules_for(&root, &[])).unwrap();

        assert_eq!(
            snapshot.directories(),
            [path_key(&root), path_key(&root.join("B"))]
        );
        assert_eq!(snapshot.known_files().len(), 1);
        let stamp = snapshot.known_files().get(&path_key(&root.join("f.txt"))).unwrap();
        assert!(stamp.ends_with('Z'));
        assert!(snapshot.pending_changes().is_empty());
    }

    #[test]
    fn test_bootstrap_skips_state_dir() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join(".garage/logs")).unwrap();
        fs::write(root.join(".garage/session"), b"x").unwrap();
        fs::write(root.join("keep.txt"), b"x").unwrap();

        let snapshot = bootstrap(root, &rules_for(root, &[])).unwrap();

        assert_eq!(snapshot.directories(), [path_key(root)]);
        assert_eq!(
            snapshot.known_files().keys().cloned().collect::<Vec<_>>(),
            vec![path_key(&root.join("keep.txt"))]
        );
    }

    #[test]
    fn test_bootstrap_prunes_ignored_subtrees() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("target/debug")).unwrap();
        fs::write(root.join("target/debug/app"), b"bin").unwrap();
        fs::write(root.join("main.rs"), b"fn main() {}").unwrap();
        fs::write(root.join("trace.log"), b"log").unwrap();

        let snapshot = bootstrap(root, &rules_for(root, &["target/", "*.log"])).unwrap();

        assert_eq!(snapshot.directories(), [path_key(root)]);
        assert_eq!(snapshot.known_files().len(), 1);
        assert!(snapshot.is_known_file(&path_key(&root.join("main.rs"))));
    }

    #[test]
    fn test_bootstrap_missing_root_fails() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("missing");

        let result = bootstrap(&root, &rules_for(temp_dir.path(), &[]));
        assert!(matches!(result, Err(crate::WatchError::Walk(_))));
    }
}
