//! # cfsync - Cloudflare allow-list synchronizer
//!
//! Keeps a cloud firewall's allow-list (an EC2 security group) in sync with
//! Cloudflare's published edge IP ranges, so only Cloudflare traffic reaches
//! a protected resource on a configured set of TCP ports. Designed to run
//! from cron or a systemd timer; each run is stateless and converges the
//! firewall to the desired state regardless of its prior contents.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        cfsync                               │
//! ├─────────────────────────────────────────────────────────────┤
//! │  CLI (clap)                                                 │
//! │    └── Commands: sync, plan, status, version                │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Config (serde_yaml + env overrides)                        │
//! │    └── Ports, security group, provider endpoint             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Provider (reqwest + rustls)                                │
//! │    └── Cloudflare published ranges -> DesiredState          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Reconcile (pure set algebra)                               │
//! │    └── (DesiredState, ObservedState, ports) -> ChangeSet    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Firewall (FirewallBackend trait)                           │
//! │    └── Ec2Backend: describe / authorize / revoke            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The reconciliation engine is the only part with real logic: per address
//! family, `add = desired - observed` and `remove = observed - desired`,
//! where desired rules are the Cartesian product of the published CIDRs and
//! the configured ports. It never touches the network; everything around it
//! is plumbing behind narrow seams so the engine can be tested exhaustively.
//!
//! ## Example Usage
//!
//! ```no_run
//! use cfsync::config::Config;
//! use cfsync::firewall::create_backend;
//! use cfsync::provider::ProviderFetcher;
//! use cfsync::reconcile::{flatten_observed, reconcile};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("/etc/cfsync/config.yaml")?;
//!
//!     let fetcher = ProviderFetcher::new(&config.provider_url)?;
//!     let backend = create_backend(&config.firewall)?;
//!
//!     let desired = fetcher.fetch_desired().await?;
//!     let observed = flatten_observed(&backend.describe().await?);
//!     let changes = reconcile(&desired, &observed, &config.ports);
//!
//!     for rule in &changes.add.ipv4 {
//!         backend.authorize(cfsync::model::AddressFamily::V4, rule).await?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`cli`] - Command-line interface definitions
//! - [`commands`] - CLI command implementations
//! - [`config`] - Configuration parsing and port-list fallback
//! - [`error`] - Boundary-classified error types
//! - [`firewall`] - Firewall backend abstraction (EC2 security groups)
//! - [`lock`] - File locking for concurrent execution prevention
//! - [`model`] - Address families, rules, and change sets
//! - [`provider`] - HTTP client for the published IP ranges
//! - [`reconcile`] - The reconciliation engine

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod firewall;
pub mod lock;
pub mod model;
pub mod provider;
pub mod reconcile;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use model::{AddressFamily, ChangeSet, Rule};
pub use reconcile::reconcile;
