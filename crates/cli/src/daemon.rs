//! Foreground supervisor entry point
//!
//! This is what `garage start --foreground` runs, both when invoked by
//! hand and inside the process group spawned by the lifecycle.

use anyhow::{Context, Result};
use garage_core::{Config, StateLayout};
use garage_watcher::{RunReport, ShutdownSignals, StopReason, Supervisor};
use tracing::info;

/// Run the supervisor until a termination signal or a fault
pub async fn run(layout: &StateLayout, config: &Config) -> Result<RunReport> {
    // Installed first so a signal during bootstrap is not lost
    let signals = ShutdownSignals::install().context("Failed to install signal handlers")?;

    info!(pid = std::process::id(), "Supervisor process started");
    let supervisor = Supervisor::start(layout, config).context("Supervisor failed to start")?;

    let report = supervisor
        .run(signals.recv())
        .await
        .context("Failed to persist snapshot; changes since the last save are lost")?;

    if let StopReason::Fault(message) = &report.reason {
        anyhow::bail!("supervisor stopped after a fault: {}", message);
    }
    Ok(report)
}
