//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cfsync")]
#[command(author, version, about = "Keep a cloud firewall allow-list in sync with Cloudflare's edge IP ranges")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "/etc/cfsync/config.yaml", global = true)]
    pub config: PathBuf,

    /// Quiet mode (for cron/systemd timer)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug output)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch provider ranges and converge the firewall allow-list
    Sync {
        /// Compute and log the plan without touching the firewall
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the changes a sync would make, without applying them
    Plan,

    /// Show the current allow-list state
    Status,

    /// Show version
    Version,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parses() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_sync_dry_run_flag() {
        let cli = Cli::parse_from(["cfsync", "sync", "--dry-run"]);
        match cli.command {
            Commands::Sync { dry_run } => assert!(dry_run),
            _ => panic!("expected sync command"),
        }
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::parse_from(["cfsync", "plan", "--config", "/tmp/test.yaml"]);
        assert_eq!(cli.config, PathBuf::from("/tmp/test.yaml"));
    }
}
