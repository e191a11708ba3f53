//! Status command: show the current allow-list state.

use anyhow::{Context, Result};
use std::path::Path;

use crate::config::Config;
use crate::firewall::create_backend;
use crate::model::AddressFamily;
use crate::reconcile::flatten_observed;

/// Run the status command
pub async fn run(config_path: &Path) -> Result<()> {
    let config = Config::load(config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    let backend = create_backend(&config.firewall)?;
    let entries = backend.describe().await?;
    let observed = flatten_observed(&entries);

    println!("Security group: {}", config.firewall.security_group_id);
    println!("Configured ports: {:?}", config.ports);
    println!();

    for entry in &entries {
        println!(
            "  port {}: {} IPv4 ranges, {} IPv6 ranges",
            entry.port,
            entry.ipv4_ranges.len(),
            entry.ipv6_ranges.len()
        );
    }
    println!();
    for family in AddressFamily::ALL {
        println!("  {}: {} rules total", family, observed.get(family).len());
    }
    Ok(())
}
