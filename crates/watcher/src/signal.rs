//! Termination signals that drain the supervisor

use crate::{Result, WatchError};
use std::fmt;
use tokio::signal::unix::{signal, Signal, SignalKind};

/// Why the supervisor left `Running`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// An OS termination signal arrived
    Signal(&'static str),
    /// An in-process stop request (tests, embedding callers)
    Requested,
    /// The watch loop could not continue
    Fault(String),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Signal(name) => write!(f, "received {}", name),
            StopReason::Requested => f.write_str("stop requested"),
            StopReason::Fault(message) => write!(f, "fault: {}", message),
        }
    }
}

/// Handlers for SIGINT, SIGTERM and SIGQUIT
///
/// All three are treated the same: stop now and save. SIGSEGV cannot be
/// caught safely, so a crashing supervisor loses its in-memory delta.
pub struct ShutdownSignals {
    interrupt: Signal,
    terminate: Signal,
    quit: Signal,
}

impl ShutdownSignals {
    /// Install the handlers; must be called inside a tokio runtime
    pub fn install() -> Result<Self> {
        Ok(Self {
            interrupt: signal(SignalKind::interrupt()).map_err(WatchError::Signal)?,
            terminate: signal(SignalKind::terminate()).map_err(WatchError::Signal)?,
            quit: signal(SignalKind::quit()).map_err(WatchError::Signal)?,
        })
    }

    /// Wait for the first termination signal
    pub async fn recv(mut self) -> StopReason {
        tokio::select! {
            _ = self.interrupt.recv() => StopReason::Signal("SIGINT"),
            _ = self.terminate.recv() => StopReason::Signal("SIGTERM"),
            _ = self.quit.recv() => StopReason::Signal("SIGQUIT"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_stop_reason_display() {
        assert_eq!(StopReason::Signal("SIGTERM").to_string(), "received SIGTERM");
        assert_eq!(StopReason::Requested.to_string(), "stop requested");
        assert_eq!(
            StopReason::Fault("watch lost".to_string()).to_string(),
            "fault: watch lost"
        );
    }

    #[tokio::test]
    async fn test_sigquit_is_a_stop_signal() {
        let signals = ShutdownSignals::install().unwrap();
        let waiter = tokio::spawn(signals.recv());

        tokio::time::sleep(Duration::from_millis(50)).await;
        nix::sys::signal::raise(nix::sys::signal::Signal::SIGQUIT).unwrap();

        let reason = tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reason, StopReason::Signal("SIGQUIT"));
    }
}
