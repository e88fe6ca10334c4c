//! File system watching for garage
//!
//! This crate provides the watch daemon itself:
//! - Ignore rules (state directory, `.garageignore`, configured patterns)
//! - One-shot tree bootstrap for a fresh snapshot
//! - Notification translation from `notify` events
//! - The diff engine that folds notifications into the snapshot
//! - The supervisor loop and its termination signals

pub mod bootstrap;
pub mod diff;
pub mod error;
pub mod ignore;
pub mod notification;
pub mod signal;
pub mod supervisor;

pub use bootstrap::bootstrap;
pub use diff::{DiffEngine, Inspect, Outcome, PathInfo, SystemInspector};
pub use error::WatchError;
pub use crate::ignore::IgnoreRules;
pub use notification::{translate, Notification};
pub use signal::{ShutdownSignals, StopReason};
pub use supervisor::{RunReport, Supervisor, SupervisorState};

/// Result type for watcher operations
pub type Result<T> = std::result::Result<T, WatchError>;
