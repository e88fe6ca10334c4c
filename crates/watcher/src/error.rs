//! Watcher error types

use garage_core::StoreError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WatchError {
    /// Loading or saving state failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The bootstrap walk hit an unreadable entry
    #[error("failed to walk watched tree: {0}")]
    Walk(#[from] walkdir::Error),

    /// Registering a directory with the OS notifier failed
    #[error("failed to watch {}: {source}", path.display())]
    Notifier {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// A notified path could not be inspected (usually removed again already)
    #[error("failed to inspect {}: {source}", path.display())]
    Vanished {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Ignore patterns could not be compiled
    #[error("invalid ignore patterns: {0}")]
    Ignore(#[from] ::ignore::Error),

    /// Termination signal handlers could not be installed
    #[error("failed to install signal handler: {0}")]
    Signal(#[source] std::io::Error),
}
