//! Background supervisor lifecycle
//!
//! The CLI and the supervisor are separate processes. The only link
//! between them is the session record, which holds the supervisor's pid,
//! and the signals the CLI sends to the supervisor's process group.

use anyhow::Context;
use command_group::CommandGroup;
use garage_core::{DaemonConfig, SessionRecord, SessionStore, Snapshot, SnapshotStore, StateLayout, StoreError};
use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::fmt;
use std::fs::File;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("failed to spawn supervisor: {0}")]
    Spawn(#[source] anyhow::Error),

    #[error("failed to signal process group {pid}: {source}")]
    Signal {
        pid: i32,
        #[source]
        source: Errno,
    },

    #[error("supervisor already running (pid {pid})")]
    AlreadyRunning { pid: i32 },

    #[error("supervisor (pid {pid}) still running after {waited:?}; snapshot left in place")]
    StillRunning { pid: i32, waited: Duration },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to hand off pending changes: {0}")]
    Transmit(#[source] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, LifecycleError>;

/// OS process operations the lifecycle depends on
pub trait ProcessControl {
    /// Start `garage start --foreground` in `root` as the leader of a new
    /// process group, with stdout and stderr appended to `log`
    fn spawn_supervisor(&self, root: &Path, log: &Path) -> anyhow::Result<i32>;

    /// `kill(2)`; a negative target addresses a process group and `None`
    /// only probes for existence
    fn kill(&self, target: i32, signal: Option<Signal>) -> nix::Result<()>;

    /// Whether any process of group `pgid` is still around
    fn group_alive(&self, pgid: i32) -> bool {
        match self.kill(-pgid, None) {
            Ok(()) => true,
            Err(Errno::EPERM) => true,
            Err(_) => false,
        }
    }
}

/// [`ProcessControl`] for the real operating system
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcesses;

impl ProcessControl for SystemProcesses {
    fn spawn_supervisor(&self, root: &Path, log: &Path) -> anyhow::Result<i32> {
        let exe = std::env::current_exe().context("Failed to get current executable path")?;

        let log_file = File::options()
            .create(true)
            .append(true)
            .open(log)
            .with_context(|| format!("Failed to open log file {}", log.display()))?;

        let child = Command::new(&exe)
            .arg("start")
            .arg("--foreground")
            .current_dir(root)
            .stdin(Stdio::null())
            .stdout(log_file.try_clone()?)
            .stderr(log_file)
            .group_spawn()
            .with_context(|| format!("Failed to spawn {}", exe.display()))?;

        let pid = i32::try_from(child.id()).context("Process id out of range")?;
        Ok(pid)
    }

    fn kill(&self, target: i32, signal: Option<Signal>) -> nix::Result<()> {
        kill(Pid::from_raw(target), signal)
    }

    fn group_alive(&self, pgid: i32) -> bool {
        match self.kill(-pgid, None) {
            // An unreaped leader keeps the group visible after it exited
            Ok(()) => !is_zombie(pgid),
            Err(Errno::EPERM) => true,
            Err(_) => false,
        }
    }
}

#[cfg(target_os = "linux")]
fn is_zombie(pid: i32) -> bool {
    std::fs::read_to_string(format!("/proc/{}/stat", pid))
        .ok()
        .and_then(|stat| {
            let rest = &stat[stat.rfind(')')? + 1..];
            rest.trim_start().chars().next()
        })
        .map_or(false, |state| state == 'Z')
}

#[cfg(not(target_os = "linux"))]
fn is_zombie(_pid: i32) -> bool {
    false
}

/// Result of a stop request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// No supervisor was recorded
    NothingToStop,
    /// SIGTERM was delivered to the group
    Signalled(i32),
    /// The recorded group no longer exists
    AlreadyExited(i32),
}

impl fmt::Display for StopOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopOutcome::NothingToStop => f.write_str("nothing to stop"),
            StopOutcome::Signalled(pid) => write!(f, "stop signal sent to supervisor (pid {})", pid),
            StopOutcome::AlreadyExited(pid) => write!(f, "supervisor (pid {}) had already exited", pid),
        }
    }
}

/// Receiver of committed change sets
pub trait ChangeSink {
    /// Hand off the pending changes of `snapshot`; returns a receipt id
    fn transmit(&mut self, message: &str, snapshot: &Snapshot) -> anyhow::Result<String>;
}

/// What a commit did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReport {
    pub stopped: StopOutcome,
    /// Receipt from the sink; `None` when there was nothing to hand off
    pub receipt: Option<String>,
    pub changes: usize,
    /// Pid of the freshly spawned supervisor
    pub pid: i32,
}

/// Spawn, stop and commit protocol for one watched root
pub struct Lifecycle<P = SystemProcesses> {
    layout: StateLayout,
    daemon: DaemonConfig,
    sessions: SessionStore,
    snapshots: SnapshotStore,
    processes: P,
}

impl Lifecycle<SystemProcesses> {
    pub fn new(layout: StateLayout, daemon: DaemonConfig) -> Self {
        Self::with_processes(layout, daemon, SystemProcesses)
    }
}

impl<P: ProcessControl> Lifecycle<P> {
    pub fn with_processes(layout: StateLayout, daemon: DaemonConfig, processes: P) -> Self {
        Self {
            sessions: SessionStore::new(layout.session_path()),
            snapshots: SnapshotStore::new(layout.snapshot_path()),
            layout,
            daemon,
            processes,
        }
    }

    pub fn processes(&self) -> &P {
        &self.processes
    }

    /// The recorded supervisor pid, if its process group is still alive
    pub fn running_pid(&self) -> Result<Option<i32>> {
        let record = self.sessions.load()?;
        if record.has_process() && self.processes.group_alive(record.background_pid) {
            Ok(Some(record.background_pid))
        } else {
            Ok(None)
        }
    }

    /// Launch a supervisor in a new process group and record its pid
    pub fn spawn(&self) -> Result<i32> {
        if let Some(pid) = self.running_pid()? {
            return Err(LifecycleError::AlreadyRunning { pid });
        }

        self.layout.ensure()?;
        let pid = self
            .processes
            .spawn_supervisor(self.layout.root(), &self.layout.log_path())
            .map_err(LifecycleError::Spawn)?;

        self.sessions.save(&SessionRecord::running(pid))?;
        info!(pid, root = %self.layout.root().display(), "Supervisor spawned");
        Ok(pid)
    }

    /// Send SIGTERM to the recorded supervisor's process group
    ///
    /// Returns as soon as the signal is delivered; the supervisor drains
    /// and saves on its own.
    pub fn stop(&self) -> Result<StopOutcome> {
        let outcome = self.signal_group()?;
        if outcome != StopOutcome::NothingToStop {
            self.sessions.clear()?;
        }
        Ok(outcome)
    }

    /// Signal the recorded group without forgetting it
    fn signal_group(&self) -> Result<StopOutcome> {
        let record = self.sessions.load()?;
        if !record.has_process() {
            debug!("No supervisor recorded");
            return Ok(StopOutcome::NothingToStop);
        }

        let pid = record.background_pid;
        let outcome = match self.processes.kill(-pid, Some(Signal::SIGTERM)) {
            Ok(()) => StopOutcome::Signalled(pid),
            Err(Errno::ESRCH) => StopOutcome::AlreadyExited(pid),
            Err(source) => return Err(LifecycleError::Signal { pid, source }),
        };

        info!(pid, %outcome, "Stop requested");
        Ok(outcome)
    }

    /// Stop, hand off, discard, respawn
    ///
    /// The snapshot is only discarded once the old supervisor's group has
    /// gone, since a draining supervisor still writes its final state.
    /// Until then its pid stays recorded so a retry or `stop` can reach it.
    pub async fn commit<S: ChangeSink>(&self, message: &str, sink: &mut S) -> Result<CommitReport> {
        let stopped = self.signal_group()?;
        if let StopOutcome::Signalled(pid) = stopped {
            self.wait_for_exit(pid).await?;
        }
        if stopped != StopOutcome::NothingToStop {
            self.sessions.clear()?;
        }

        let snapshot = self.snapshots.read()?;
        let changes = snapshot
            .as_ref()
            .map_or(0, |s| s.pending_changes().len());

        let receipt = match snapshot {
            Some(ref snapshot) if changes > 0 => match sink.transmit(message, snapshot) {
                Ok(receipt) => Some(receipt),
                Err(e) => {
                    error!(error = %e, "Hand-off failed, keeping snapshot");
                    if let Err(respawn) = self.spawn() {
                        warn!(error = %respawn, "Failed to restart supervisor");
                    }
                    return Err(LifecycleError::Transmit(e));
                }
            },
            _ => None,
        };

        self.snapshots.discard()?;
        let pid = self.spawn()?;

        Ok(CommitReport {
            stopped,
            receipt,
            changes,
            pid,
        })
    }

    /// Poll until the process group is gone, bounded by the stop timeout
    async fn wait_for_exit(&self, pid: i32) -> Result<()> {
        let timeout = self.daemon.stop_timeout();
        let started = Instant::now();

        while self.processes.group_alive(pid) {
            if started.elapsed() >= timeout {
                return Err(LifecycleError::StillRunning {
                    pid,
                    waited: started.elapsed(),
                });
            }
            tokio::time::sleep(self.daemon.poll_interval()).await;
        }

        debug!(pid, waited = ?started.elapsed(), "Supervisor exited");
        Ok(())
    }
}
