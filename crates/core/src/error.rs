//! Error taxonomy for persisted state

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading or writing files under the state directory
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing a record failed
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A persisted record could not be decoded
    #[error("corrupt state record {}: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: bincode::Error,
    },

    /// A record could not be encoded
    #[error("failed to encode state record: {0}")]
    Encode(#[source] bincode::Error),

    /// The configuration file is malformed or out of range
    #[error("invalid configuration {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    /// No `.garage` directory was found above the starting directory
    #[error("not a garage directory (no .garage found above {})", start.display())]
    NotInitialised { start: PathBuf },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
