//! Show pending changes from the persisted snapshot

use anyhow::{Context, Result};
use garage_cli::util;
use garage_core::{Change, SnapshotStore};
use owo_colors::OwoColorize;

pub async fn run() -> Result<()> {
    let layout = util::find_root()?;
    let snapshot = SnapshotStore::new(layout.snapshot_path())
        .read()
        .context("Failed to read snapshot")?;

    let Some(snapshot) = snapshot else {
        println!("{}", "No snapshot yet".dimmed());
        return Ok(());
    };

    if snapshot.pending_changes().is_empty() {
        println!("{}", "No pending changes".dimmed());
        return Ok(());
    }

    for (path, change) in snapshot.pending_changes() {
        let path = util::display_path(&layout, path);
        match change {
            Change::Created => println!("{} {}", "A".green(), path),
            Change::Deleted => println!("{} {}", "D".red(), path),
            Change::Modified(stamp) => println!("{} {} {}", "M".yellow(), path, stamp.dimmed()),
        }
    }
    println!();
    println!("{} pending changes", snapshot.pending_changes().len());

    Ok(())
}
