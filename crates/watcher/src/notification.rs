//! Translation of raw `notify` events into the notifications the diff
//! engine understands

use notify::event::{ModifyKind, RemoveKind, RenameMode};
use notify::{Event, EventKind};
use std::path::PathBuf;

/// A single observed file system change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Something appeared at the path
    Created(PathBuf),
    /// The content of the path was written
    Modified(PathBuf),
    /// Something disappeared from the path
    ///
    /// `directory` is set when the backend reported the removed entry as
    /// a directory. The path can no longer be inspected, so this hint is
    /// all the engine has besides its own records.
    Removed { path: PathBuf, directory: bool },
}

impl Notification {
    pub fn path(&self) -> &PathBuf {
        match self {
            Notification::Created(path) => path,
            Notification::Modified(path) => path,
            Notification::Removed { path, .. } => path,
        }
    }
}

/// Map one backend event to zero or more notifications
///
/// Access and metadata-only events are dropped. Rename halves are
/// treated as removal of the old name and creation of the new one; the
/// combined rename event some backends emit after both halves is
/// skipped so the pair is not counted twice.
pub fn translate(event: &Event) -> Vec<Notification> {
    match &event.kind {
        EventKind::Create(_) => event
            .paths
            .iter()
            .cloned()
            .map(Notification::Created)
            .collect(),

        EventKind::Remove(kind) => {
            let directory = matches!(kind, RemoveKind::Folder);
            event
                .paths
                .iter()
                .map(|path| Notification::Removed {
                    path: path.clone(),
                    directory,
                })
                .collect()
        }

        EventKind::Modify(ModifyKind::Data(_)) | EventKind::Modify(ModifyKind::Any) => event
            .paths
            .iter()
            .cloned()
            .map(Notification::Modified)
            .collect(),

        EventKind::Modify(ModifyKind::Name(mode)) => match mode {
            RenameMode::From => event
                .paths
                .iter()
                .map(|path| Notification::Removed {
                    path: path.clone(),
                    directory: false,
                })
                .collect(),
            RenameMode::To => event
                .paths
                .iter()
                .cloned()
                .map(Notification::Created)
                .collect(),
            RenameMode::Both => Vec::new(),
            // Backends that cannot tell the halves apart
            RenameMode::Any | RenameMode::Other => event
                .paths
                .iter()
                .map(|path| {
                    if path.exists() {
                        Notification::Created(path.clone())
                    } else {
                        Notification::Removed {
                            path: path.clone(),
                            directory: false,
                        }
                    }
                })
                .collect(),
        },

        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, MetadataKind};
    use tempfile::TempDir;

    fn event(kind: EventKind, paths: &[&str]) -> Event {
        let mut event = Event::new(kind);
        for path in paths {
            event = event.add_path(PathBuf::from(path));
        }
        event
    }

    #[test]
    fn test_create_maps_to_created() {
        let translated = translate(&event(EventKind::Create(CreateKind::File), &["/w/a.txt"]));

        assert_eq!(translated, vec![Notification::Created(PathBuf::from("/w/a.txt"))]);
    }

    #[test]
    fn test_remove_folder_sets_directory_hint() {
        let folder = translate(&event(EventKind::Remove(RemoveKind::Folder), &["/w/dir"]));
        let file = translate(&event(EventKind::Remove(RemoveKind::File), &["/w/a.txt"]));

        assert_eq!(
            folder,
            vec![Notification::Removed {
                path: PathBuf::from("/w/dir"),
                directory: true
            }]
        );
        assert_eq!(
            file,
            vec![Notification::Removed {
                path: PathBuf::from("/w/a.txt"),
                directory: false
            }]
        );
    }

    #[test]
    fn test_data_write_maps_to_modified() {
        let translated = translate(&event(
            EventKind::Modify(ModifyKind::Data(DataChange::Content)),
            &["/w/a.txt"],
        ));

        assert_eq!(translated, vec![Notification::Modified(PathBuf::from("/w/a.txt"))]);
    }

    #[test]
    fn test_access_and_metadata_are_dropped() {
        assert!(translate(&event(EventKind::Access(AccessKind::Any), &["/w/a.txt"])).is_empty());
        assert!(translate(&event(
            EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions)),
            &["/w/a.txt"]
        ))
        .is_empty());
    }

    #[test]
    fn test_rename_halves() {
        let from = translate(&event(
            EventKind::Modify(ModifyKind::Name(RenameMode::From)),
            &["/w/old.txt"],
        ));
        let to = translate(&event(
            EventKind::Modify(ModifyKind::Name(RenameMode::To)),
            &["/w/new.txt"],
        ));
        let both = translate(&event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &["/w/old.txt", "/w/new.txt"],
        ));

        assert_eq!(
            from,
            vec![Notification::Removed {
                path: PathBuf::from("/w/old.txt"),
                directory: false
            }]
        );
        assert_eq!(to, vec![Notification::Created(PathBuf::from("/w/new.txt"))]);
        assert!(both.is_empty());
    }

    #[test]
    fn test_ambiguous_rename_resolved_by_existence() {
        let temp_dir = TempDir::new().unwrap();
        let present = temp_dir.path().join("present.txt");
        let gone = temp_dir.path().join("gone.txt");
        std::fs::write(&present, b"x").unwrap();

        let kind = EventKind::Modify(ModifyKind::Name(RenameMode::Any));
        let translated = translate(&Event::new(kind).add_path(present.clone()).add_path(gone.clone()));

        assert_eq!(
            translated,
            vec![
                Notification::Created(present),
                Notification::Removed {
                    path: gone,
                    directory: false
                }
            ]
        );
    }
}
