//! Garage CLI library
//!
//! Process lifecycle, the commit outbox and the foreground supervisor
//! entry point, shared by the `garage` binary and its tests.

pub mod daemon;
pub mod lifecycle;
pub mod outbox;
pub mod util;

pub use lifecycle::{ChangeSink, CommitReport, Lifecycle, LifecycleError, ProcessControl, StopOutcome, SystemProcesses};
pub use outbox::{Outbox, OutboxEntry};
