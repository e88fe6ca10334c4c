//! Stop the garage supervisor

use anyhow::{Context, Result};
use garage_cli::util;
use garage_cli::{Lifecycle, StopOutcome};
use owo_colors::OwoColorize;

pub async fn run() -> Result<()> {
    let layout = util::find_root()?;
    let config = util::load_config(&layout)?;
    let lifecycle = Lifecycle::new(layout, config.daemon);

    let outcome = lifecycle.stop().context("Failed to stop supervisor")?;
    match outcome {
        StopOutcome::NothingToStop => println!("{}", "Nothing to stop".dimmed()),
        StopOutcome::Signalled(pid) => {
            println!("{} (pid {})", "Stop signal sent".green(), pid);
            println!("{}", "The supervisor saves its snapshot before exiting".dimmed());
        }
        StopOutcome::AlreadyExited(pid) => {
            println!("{}", format!("Supervisor (pid {}) had already exited", pid).yellow())
        }
    }
    Ok(())
}
