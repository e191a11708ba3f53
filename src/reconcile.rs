//! The reconciliation engine: pure set algebra over (CIDR, port) pairs.
//!
//! Takes the provider's desired ranges and the firewall's observed rules and
//! computes the minimal additions and removals that converge the firewall,
//! independently per address family. No I/O, no shared state — safe to call
//! concurrently on independent inputs, and re-running after a full apply
//! always yields an empty plan.

use tracing::warn;

use crate::model::{
    AddressFamily, ChangeSet, DesiredState, ObservedState, PerFamily, Rule, RuleEntry, RuleSet,
};

/// Ports used when the configured list is empty or unparseable. A bad port
/// configuration must never be read as "allow nothing", because an empty
/// desired set would plan the removal of every existing rule.
pub const DEFAULT_PORTS: &[u16] = &[80];

/// Expand per-family CIDR sets into concrete rules: every CIDR paired with
/// every configured port (Cartesian product).
pub fn expand_desired(desired: &DesiredState, ports: &[u16]) -> PerFamily<RuleSet> {
    let ports = effective_ports(ports);
    let mut rules = PerFamily::<RuleSet>::default();
    for family in AddressFamily::ALL {
        let out = rules.get_mut(family);
        for cidr in desired.get(family) {
            for &port in ports {
                out.insert(Rule::new(cidr.clone(), port));
            }
        }
    }
    rules
}

/// Flatten firewall ingress entries into per-family rule sets.
///
/// An entry with no ranges for a family contributes nothing for that family;
/// a (CIDR, port) pair appearing in several entries collapses to one rule.
pub fn flatten_observed(entries: &[RuleEntry]) -> ObservedState {
    let mut observed = ObservedState::default();
    for entry in entries {
        for cidr in &entry.ipv4_ranges {
            observed.ipv4.insert(Rule::new(cidr.clone(), entry.port));
        }
        for cidr in &entry.ipv6_ranges {
            observed.ipv6.insert(Rule::new(cidr.clone(), entry.port));
        }
    }
    observed
}

/// Compute the additions and removals needed to converge the observed rules
/// onto the desired ranges.
///
/// Per family: `add = desired - observed`, `remove = observed - desired`.
/// The two families never influence each other, and an empty desired set for
/// a family means every observed rule of that family is removed.
pub fn reconcile(desired: &DesiredState, observed: &ObservedState, ports: &[u16]) -> ChangeSet {
    let wanted = expand_desired(desired, ports);
    let mut changes = ChangeSet::default();
    for family in AddressFamily::ALL {
        let want = wanted.get(family);
        let have = observed.get(family);
        *changes.add.get_mut(family) = want.difference(have).cloned().collect();
        *changes.remove.get_mut(family) = have.difference(want).cloned().collect();
    }
    changes
}

fn effective_ports(ports: &[u16]) -> &[u16] {
    if ports.is_empty() {
        warn!(
            "No ports configured, falling back to port {}",
            DEFAULT_PORTS[0]
        );
        DEFAULT_PORTS
    } else {
        ports
    }
}
