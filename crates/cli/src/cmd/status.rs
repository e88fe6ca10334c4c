//! Show supervisor and snapshot status

use anyhow::{Context, Result};
use garage_cli::util;
use garage_cli::{Lifecycle, Outbox};
use garage_core::{SessionStore, SnapshotStore};
use owo_colors::OwoColorize;

pub async fn run() -> Result<()> {
    // 1. Find the watched tree
    let layout = util::find_root()?;
    let config = util::load_config(&layout)?;

    // 2. Check supervisor status
    let session = SessionStore::new(layout.session_path())
        .load()
        .context("Failed to read session record")?;
    let lifecycle = Lifecycle::new(layout.clone(), config.daemon);
    let running = lifecycle.running_pid()?;

    // 3. Read the persisted snapshot (a copy, never the live one)
    let snapshot = SnapshotStore::new(layout.snapshot_path())
        .read()
        .context("Failed to read snapshot")?;

    let history = Outbox::new(&layout).list()?;

    println!("{}", "Garage Status".bold());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();

    println!("Root:          {}", layout.root().display().to_string().cyan());
    println!();

    print!("Supervisor:    ");
    match running {
        Some(pid) => {
            println!("{}", "Running ✓".green());
            println!("  PID:         {}", pid);
            println!(
                "  Started:     {} ({})",
                util::format_relative_time(session.started_at_ms),
                util::format_absolute_time(session.started_at_ms).dimmed()
            );
        }
        None if session.has_process() => {
            println!("{}", "Exited".yellow());
            println!(
                "  {}",
                format!("pid {} is gone; see {}", session.background_pid, layout.log_path().display())
                    .dimmed()
            );
        }
        None => {
            println!("{}", "Not running".yellow());
            println!("  {}", "Tip: Start with 'garage start'".dimmed());
        }
    }
    println!();

    println!("Snapshot:");
    match snapshot {
        Some(snapshot) => {
            println!("  Directories: {}", snapshot.directories().len());
            println!("  Files:       {}", snapshot.known_files().len());
            println!("  Pending:     {}", snapshot.pending_changes().len());
        }
        None => println!("  {}", "None yet (created when the supervisor stops)".dimmed()),
    }
    println!();

    println!("Saved change sets: {}", history.len());
    if running.is_some() {
        println!();
        println!(
            "{}",
            "Note: changes since the supervisor started are persisted when it stops.".dimmed()
        );
    }

    Ok(())
}
