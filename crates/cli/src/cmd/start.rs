//! Start the garage supervisor

use anyhow::{Context, Result};
use garage_cli::util;
use garage_cli::Lifecycle;
use owo_colors::OwoColorize;
use std::time::Duration;

pub async fn run(foreground: bool) -> Result<()> {
    if foreground {
        start_foreground().await
    } else {
        start_background().await
    }
}

async fn start_foreground() -> Result<()> {
    let layout = util::find_or_create_root()?;
    let config = util::load_config(&layout)?;

    let report = garage_cli::daemon::run(&layout, &config).await?;
    println!(
        "Supervisor stopped ({}): {} directories, {} pending changes saved",
        report.reason, report.directories, report.pending
    );
    Ok(())
}

async fn start_background() -> Result<()> {
    let layout = util::find_or_create_root()?;
    let config = util::load_config(&layout)?;
    let lifecycle = Lifecycle::new(layout.clone(), config.daemon.clone());

    let pid = lifecycle.spawn().context("Failed to start supervisor")?;

    // Wait a moment to verify it started
    tokio::time::sleep(Duration::from_millis(300)).await;

    if lifecycle.running_pid()?.is_some() {
        println!("{} (pid {})", "Supervisor started".green(), pid);
        println!("Watching: {}", layout.root().display().to_string().cyan());
        println!("Logs:     {}", layout.log_path().display());
        Ok(())
    } else {
        anyhow::bail!(
            "Supervisor exited right after starting (check logs at {})",
            layout.log_path().display()
        );
    }
}
