//! cfsync - keep a cloud firewall allow-list in sync with Cloudflare's
//! published edge IP ranges.

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use cfsync::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Sync { dry_run } => cfsync::commands::sync::run(dry_run, &cli.config).await,
        Commands::Plan => cfsync::commands::plan::run(&cli.config).await,
        Commands::Status => cfsync::commands::status::run(&cli.config).await,
        Commands::Version => {
            println!("cfsync {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
