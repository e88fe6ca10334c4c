//! Show committed change sets

use anyhow::Result;
use garage_cli::util;
use garage_cli::Outbox;
use owo_colors::OwoColorize;

pub async fn run(limit: Option<usize>) -> Result<()> {
    let layout = util::find_root()?;
    let entries = Outbox::new(&layout).list()?;

    if entries.is_empty() {
        println!("{}", "No saved change sets".dimmed());
        return Ok(());
    }

    // Newest first
    let limit = limit.unwrap_or(entries.len());
    for entry in entries.iter().rev().take(limit) {
        println!(
            "{} {} {} - {} changes",
            entry.id.to_string().yellow(),
            util::format_relative_time(entry.committed_at_ms).dimmed(),
            entry.message,
            entry.changes.len()
        );
    }

    Ok(())
}
