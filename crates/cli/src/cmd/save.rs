//! Commit pending changes and restart the supervisor

use anyhow::{Context, Result};
use garage_cli::util;
use garage_cli::{Lifecycle, Outbox};
use owo_colors::OwoColorize;

pub async fn run(message: &str) -> Result<()> {
    let layout = util::find_root()?;
    let config = util::load_config(&layout)?;
    let lifecycle = Lifecycle::new(layout.clone(), config.daemon);
    let mut outbox = Outbox::new(&layout);

    let report = lifecycle
        .commit(message, &mut outbox)
        .await
        .context("Save failed")?;

    match report.receipt {
        Some(id) => println!(
            "{} {} ({} changes)",
            "Saved".green(),
            id.yellow(),
            report.changes
        ),
        None => println!("{}", "No pending changes to save".dimmed()),
    }
    println!("Supervisor restarted (pid {})", report.pid);
    Ok(())
}
