//! Watch supervisor
//!
//! Owns the live snapshot for the lifetime of one watch session and moves
//! through `Initializing -> Running -> Draining -> Stopped`:
//! - `Initializing` loads or bootstraps the snapshot and registers every
//!   watched directory. Any registration failure aborts startup.
//! - `Running` multiplexes the stop future, notifier errors and notifier
//!   events with no priority between them.
//! - `Draining` drops the OS watches; no further events are processed.
//! - `Stopped` persists the snapshot exactly once.

use crate::bootstrap::bootstrap;
use crate::diff::{DiffEngine, Outcome};
use crate::ignore::IgnoreRules;
use crate::notification::translate;
use crate::signal::StopReason;
use crate::{Result, WatchError};
use garage_core::{Config, Snapshot, SnapshotStore, StateLayout};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::fmt;
use std::future::Future;
use std::path::Path;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Initializing,
    Running,
    Draining,
    Stopped,
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SupervisorState::Initializing => "initializing",
            SupervisorState::Running => "running",
            SupervisorState::Draining => "draining",
            SupervisorState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Summary of a finished run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub reason: StopReason,
    /// Watched directories at shutdown
    pub directories: usize,
    /// Pending changes persisted at shutdown
    pub pending: usize,
}

/// The snapshot together with everything that mutates it
struct LiveTree {
    snapshot: Snapshot,
    engine: DiffEngine,
    watcher: RecommendedWatcher,
}

impl LiveTree {
    /// Fold one backend event into the snapshot, keeping the watch set in
    /// step with the directory list
    fn process(&mut self, event: &Event) -> Result<()> {
        for notification in translate(event) {
            match self.engine.apply(&mut self.snapshot, &notification)? {
                Outcome::WatchDirectory(path) => {
                    self.watcher
                        .watch(&path, RecursiveMode::NonRecursive)
                        .map_err(|source| WatchError::Notifier {
                            path: path.clone(),
                            source,
                        })?;
                    info!(path = %path.display(), "Watching new directory");
                }
                Outcome::DirectoryRemoved(path) => {
                    // The OS usually drops the watch together with the directory
                    if let Err(e) = self.watcher.unwatch(&path) {
                        debug!(path = %path.display(), error = %e, "Unwatch after removal");
                    }
                }
                Outcome::Recorded | Outcome::Unchanged => {}
            }
        }
        Ok(())
    }
}

pub struct Supervisor {
    store: SnapshotStore,
    tree: LiveTree,
    events: mpsc::UnboundedReceiver<Event>,
    errors: mpsc::UnboundedReceiver<notify::Error>,
}

impl Supervisor {
    /// Run `Initializing`: load or bootstrap, then register every directory
    pub fn start(layout: &StateLayout, config: &Config) -> Result<Self> {
        info!(root = %layout.root().display(), state = %SupervisorState::Initializing, "Supervisor starting");

        let rules = IgnoreRules::load(layout, config.watcher.clone())?;
        let store = SnapshotStore::new(layout.snapshot_path());

        let loaded = store.load(layout.root())?;
        let snapshot = if loaded.needs_bootstrap() {
            info!("No snapshot found, bootstrapping");
            bootstrap(layout.root(), &rules)?
        } else {
            let snapshot = loaded.into_snapshot();
            info!(
                directories = snapshot.directories().len(),
                pending = snapshot.pending_changes().len(),
                "Resuming from snapshot"
            );
            snapshot
        };

        let (event_tx, events) = mpsc::unbounded_channel();
        let (error_tx, errors) = mpsc::unbounded_channel();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            // Receivers only go away once the supervisor is draining
            match res {
                Ok(event) => {
                    let _ = event_tx.send(event);
                }
                Err(e) => {
                    let _ = error_tx.send(e);
                }
            }
        })
        .map_err(|source| WatchError::Notifier {
            path: layout.root().to_path_buf(),
            source,
        })?;

        for dir in snapshot.directories() {
            let path = Path::new(dir);
            watcher
                .watch(path, RecursiveMode::NonRecursive)
                .map_err(|source| WatchError::Notifier {
                    path: path.to_path_buf(),
                    source,
                })?;
        }
        debug!(directories = snapshot.directories().len(), "Registered watches");

        Ok(Self {
            store,
            tree: LiveTree {
                snapshot,
                engine: DiffEngine::new(rules),
                watcher,
            },
            events,
            errors,
        })
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.tree.snapshot
    }

    /// Drive `Running` until `stop` resolves or the loop faults, then
    /// drain and persist
    ///
    /// The snapshot is saved on every exit path out of `Running`. A failed
    /// save is returned as an error; the in-memory delta is lost then.
    pub async fn run<F>(self, stop: F) -> Result<RunReport>
    where
        F: Future<Output = StopReason>,
    {
        let Supervisor {
            store,
            mut tree,
            mut events,
            mut errors,
        } = self;

        info!(state = %SupervisorState::Running, "Supervisor running");
        tokio::pin!(stop);

        let reason = loop {
            tokio::select! {
                reason = &mut stop => break reason,

                Some(err) = errors.recv() => {
                    warn!(error = %err, paths = ?err.paths, "Notifier error");
                }

                Some(event) = events.recv() => {
                    if let Err(e) = tree.process(&event) {
                        error!(error = %e, "Cannot continue watching");
                        break StopReason::Fault(e.to_string());
                    }
                }

                else => break StopReason::Fault("notifier channels closed".to_string()),
            }
        };

        info!(state = %SupervisorState::Draining, %reason, "Supervisor draining");
        let LiveTree {
            snapshot, watcher, ..
        } = tree;
        drop(watcher);
        drop(events);
        drop(errors);

        store.save(&snapshot)?;

        let report = RunReport {
            reason,
            directories: snapshot.directories().len(),
            pending: snapshot.pending_changes().len(),
        };
        info!(
            state = %SupervisorState::Stopped,
            directories = report.directories,
            pending = report.pending,
            "Supervisor stopped"
        );
        Ok(report)
    }
}
