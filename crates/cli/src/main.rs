//! Garage CLI - garage command

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd;

/// Garage - watch a directory tree and commit its changes
#[derive(Parser)]
#[command(name = "garage")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start watching the current tree in the background
    Start {
        /// Run the supervisor in this process
        #[arg(long)]
        foreground: bool,
    },
    /// Stop the background supervisor
    Stop,
    /// Commit pending changes and restart watching
    Save {
        /// Commit message
        message: String,
    },
    /// Show supervisor and snapshot status
    Status,
    /// Show pending changes
    Changes,
    /// List watched directories and baseline files
    List,
    /// Show committed change sets
    History {
        /// Number of entries to show (default: all)
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Start { foreground } => cmd::start::run(foreground).await,
        Commands::Stop => cmd::stop::run().await,
        Commands::Save { message } => cmd::save::run(&message).await,
        Commands::Status => cmd::status::run().await,
        Commands::Changes => cmd::changes::run().await,
        Commands::List => cmd::list::run().await,
        Commands::History { limit } => cmd::history::run(limit).await,
    }
}

/// `GARAGE_LOG` wins; otherwise the tree's configured filter
fn init_tracing() {
    let filter = EnvFilter::try_from_env("GARAGE_LOG").unwrap_or_else(|_| {
        let configured = garage_cli::util::find_root()
            .and_then(|layout| garage_cli::util::load_config(&layout))
            .map(|config| config.daemon.log_filter)
            .unwrap_or_else(|_| "info".to_string());
        EnvFilter::try_new(configured).unwrap_or_else(|_| EnvFilter::new("info"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
