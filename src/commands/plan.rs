//! Plan command: print the changes a sync would make, without applying.

use anyhow::{Context, Result};
use std::path::Path;

use super::sync::compute_changes;
use crate::config::Config;
use crate::firewall::create_backend;
use crate::model::AddressFamily;
use crate::provider::ProviderFetcher;

/// Run the plan command
pub async fn run(config_path: &Path) -> Result<()> {
    let config = Config::load(config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    let fetcher = ProviderFetcher::new(&config.provider_url)?;
    let backend = create_backend(&config.firewall)?;

    let desired = fetcher.fetch_desired().await?;
    let changes = compute_changes(&desired, backend.as_ref(), &config.ports).await?;

    if changes.is_empty() {
        println!("No drift: allow-list matches the provider ranges");
        return Ok(());
    }

    for family in AddressFamily::ALL {
        for rule in changes.add.get(family) {
            println!("+ {} {}", family, rule);
        }
        for rule in changes.remove.get(family) {
            println!("- {} {}", family, rule);
        }
    }
    println!();
    println!(
        "{} to add, {} to remove",
        changes.add_count(),
        changes.remove_count()
    );
    Ok(())
}
