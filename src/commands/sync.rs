//! Sync command: fetch both snapshots, reconcile, apply.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use crate::config::Config;
use crate::firewall::{create_backend, FirewallBackend};
use crate::lock::LockGuard;
use crate::model::{AddressFamily, ChangeSet, DesiredState};
use crate::provider::ProviderFetcher;
use crate::reconcile::{flatten_observed, reconcile};

/// Run the sync command
pub async fn run(dry_run: bool, config_path: &Path) -> Result<()> {
    let _lock = LockGuard::acquire()?;

    let config = Config::load(config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    let fetcher = ProviderFetcher::new(&config.provider_url)?;
    let backend = create_backend(&config.firewall)?;

    info!(
        "Syncing security group {} on ports {:?}",
        config.firewall.security_group_id, config.ports
    );

    let desired = fetcher.fetch_desired().await?;
    let changes = compute_changes(&desired, backend.as_ref(), &config.ports).await?;
    log_plan(&changes);

    if changes.is_empty() {
        println!("[OK] Allow-list already converged, nothing to do");
        return Ok(());
    }

    if dry_run {
        println!(
            "[DRY-RUN] {} additions and {} removals not applied",
            changes.add_count(),
            changes.remove_count()
        );
        return Ok(());
    }

    apply_changes(backend.as_ref(), &changes).await?;

    println!(
        "[OK] {} rules added, {} rules removed",
        changes.add_count(),
        changes.remove_count()
    );
    Ok(())
}

/// Read the firewall and run the reconciliation engine. A failed read
/// aborts before any diff is computed: an unreadable rule set is unknown,
/// not empty.
pub async fn compute_changes(
    desired: &DesiredState,
    backend: &dyn FirewallBackend,
    ports: &[u16],
) -> Result<ChangeSet> {
    let entries = backend.describe().await?;

    for entry in &entries {
        info!(
            "Rule for port {} has {} IPv4 ranges and {} IPv6 ranges",
            entry.port,
            entry.ipv4_ranges.len(),
            entry.ipv6_ranges.len()
        );
    }

    let observed = flatten_observed(&entries);
    Ok(reconcile(desired, &observed, ports))
}

/// Apply the plan: additions first, then removals, so matching traffic is
/// never dropped while the provider re-slices its ranges. Both families get
/// identical treatment.
pub async fn apply_changes(backend: &dyn FirewallBackend, changes: &ChangeSet) -> Result<()> {
    for family in AddressFamily::ALL {
        for rule in changes.add.get(family) {
            info!("Adding {} ({})", rule, family);
            backend.authorize(family, rule).await?;
        }
    }
    for family in AddressFamily::ALL {
        for rule in changes.remove.get(family) {
            info!("Removing {} ({})", rule, family);
            backend.revoke(family, rule).await?;
        }
    }
    Ok(())
}

fn log_plan(changes: &ChangeSet) {
    for family in AddressFamily::ALL {
        for rule in changes.add.get(family) {
            info!("Plan: add {} ({})", rule, family);
        }
        for rule in changes.remove.get(family) {
            info!("Plan: remove {} ({})", rule, family);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::firewall::mock::MockBackend;
    use crate::model::{PerFamily, Rule, RuleEntry, RuleSet};
    use std::collections::BTreeSet;

    fn to_set(items: &[(&str, u16)]) -> RuleSet {
        items
            .iter()
            .map(|&(cidr, port)| Rule::new(cidr, port))
            .collect()
    }

    fn cloudflare_entry(port: u16) -> RuleEntry {
        RuleEntry {
            port,
            ipv4_ranges: vec!["104.16.0.0/12".to_string()],
            ipv6_ranges: vec!["2400:cb00::/32".to_string()],
        }
    }

    #[tokio::test]
    async fn test_compute_changes_converged_group() {
        let backend = MockBackend::new(vec![cloudflare_entry(80), cloudflare_entry(443)]);
        let desired = DesiredState {
            ipv4: BTreeSet::from(["104.16.0.0/12".to_string()]),
            ipv6: BTreeSet::from(["2400:cb00::/32".to_string()]),
        };

        let changes = compute_changes(&desired, &backend, &[80, 443]).await.unwrap();
        assert!(changes.is_empty());
    }

    #[tokio::test]
    async fn test_compute_changes_detects_drift() {
        let backend = MockBackend::new(vec![cloudflare_entry(80)]);
        let desired = DesiredState {
            ipv4: BTreeSet::from(["104.16.0.0/13".to_string()]),
            ipv6: BTreeSet::from(["2400:cb00::/32".to_string()]),
        };

        let changes = compute_changes(&desired, &backend, &[80]).await.unwrap();
        assert_eq!(changes.add.ipv4, to_set(&[("104.16.0.0/13", 80)]));
        assert_eq!(changes.remove.ipv4, to_set(&[("104.16.0.0/12", 80)]));
        assert!(changes.add.ipv6.is_empty());
        assert!(changes.remove.ipv6.is_empty());
    }

    #[tokio::test]
    async fn test_compute_changes_aborts_on_read_failure() {
        // An unreadable rule set must never be reconciled as if it were
        // empty; that would plan "add everything" against unknown state.
        let backend = MockBackend::failing();
        let desired = DesiredState::default();

        let result = compute_changes(&desired, &backend, &[80]).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_apply_issues_one_call_per_rule() {
        let backend = MockBackend::new(Vec::new());
        let changes = ChangeSet {
            add: PerFamily {
                ipv4: to_set(&[("104.16.0.0/13", 80), ("104.16.0.0/13", 443)]),
                ipv6: to_set(&[("2400:cb00::/32", 443)]),
            },
            remove: PerFamily {
                ipv4: to_set(&[("104.16.0.0/12", 80)]),
                ipv6: RuleSet::new(),
            },
        };

        apply_changes(&backend, &changes).await.unwrap();

        let authorized = backend.authorized.lock().unwrap();
        let revoked = backend.revoked.lock().unwrap();
        assert_eq!(authorized.len(), 3);
        assert_eq!(revoked.len(), 1);
        assert!(authorized.contains(&(AddressFamily::V6, Rule::new("2400:cb00::/32", 443))));
        assert_eq!(
            revoked[0],
            (AddressFamily::V4, Rule::new("104.16.0.0/12", 80))
        );
    }

    #[tokio::test]
    async fn test_empty_changeset_applies_nothing() {
        let backend = MockBackend::new(vec![cloudflare_entry(80)]);

        apply_changes(&backend, &ChangeSet::default()).await.unwrap();
        assert!(backend.authorized.lock().unwrap().is_empty());
        assert!(backend.revoked.lock().unwrap().is_empty());
    }
}
