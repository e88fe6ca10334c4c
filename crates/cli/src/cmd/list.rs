//! List watched directories and baseline files

use anyhow::{Context, Result};
use garage_cli::util;
use garage_core::SnapshotStore;
use owo_colors::OwoColorize;

pub async fn run() -> Result<()> {
    let layout = util::find_root()?;
    let Some(snapshot) = SnapshotStore::new(layout.snapshot_path())
        .read()
        .context("Failed to read snapshot")?
    else {
        println!("{}", "No snapshot yet".dimmed());
        return Ok(());
    };

    println!("{}", "Directories".bold());
    for dir in snapshot.directories() {
        println!("  {}", util::display_path(&layout, dir).cyan());
    }
    println!();

    println!("{}", "Files".bold());
    for (path, stamp) in snapshot.known_files() {
        println!("  {} {}", util::display_path(&layout, path), stamp.dimmed());
    }

    Ok(())
}
