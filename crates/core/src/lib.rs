//! Garage Core - durable state for the garage watch daemon
//!
//! This crate provides the persistence layer shared by the supervisor and
//! the command-line front end:
//! - Snapshot model and the pending change descriptor
//! - Snapshot store (single binary record, atomic replace)
//! - Session record linking the CLI to a running supervisor
//! - State directory layout and configuration

pub mod config;
pub mod error;
pub mod layout;
pub mod session;
pub mod snapshot;
pub mod store;

// Re-export main types for convenience
pub use config::{Config, DaemonConfig, WatcherConfig};
pub use error::StoreError;
pub use layout::{StateLayout, STATE_DIR_NAME};
pub use session::{current_timestamp_ms, SessionRecord, SessionStore};
pub use snapshot::{modified_stamp, path_key, Change, Snapshot};
pub use store::{atomic_write, LoadOutcome, SnapshotStore};

/// Common result type used throughout garage-core
pub type Result<T> = std::result::Result<T, StoreError>;
