//! Data model for the reconciliation engine.
//!
//! Everything here is a plain in-memory value: the engine never touches the
//! network or a cloud SDK. CIDRs are kept as opaque string tokens — two
//! entries denote the same range iff their strings are equal; no subnet
//! arithmetic or containment logic is performed anywhere.

use std::collections::BTreeSet;
use std::fmt;

/// Address family of a CIDR range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    V4,
    V6,
}

impl AddressFamily {
    /// All families, in fixed iteration order. Adding a family means adding
    /// a variant here and a field to [`PerFamily`]; the diff algorithm does
    /// not change.
    pub const ALL: [AddressFamily; 2] = [AddressFamily::V4, AddressFamily::V6];
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFamily::V4 => f.write_str("ipv4"),
            AddressFamily::V6 => f.write_str("ipv6"),
        }
    }
}

/// A single allow-list entry: one CIDR range on one TCP port.
///
/// Derives Ord so rule sets iterate (and log) in a deterministic order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rule {
    pub cidr: String,
    pub port: u16,
}

impl Rule {
    pub fn new(cidr: impl Into<String>, port: u16) -> Self {
        Self {
            cidr: cidr.into(),
            port,
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on port {}", self.cidr, self.port)
    }
}

/// An ordered, deduplicated set of rules for one address family.
pub type RuleSet = BTreeSet<Rule>;

/// A fixed-shape record holding one value per address family.
///
/// Both families are always present, so a family with no changes still
/// carries its (empty) set and the compiler enforces that no code path can
/// forget one of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PerFamily<T> {
    pub ipv4: T,
    pub ipv6: T,
}

impl<T> PerFamily<T> {
    pub fn get(&self, family: AddressFamily) -> &T {
        match family {
            AddressFamily::V4 => &self.ipv4,
            AddressFamily::V6 => &self.ipv6,
        }
    }

    pub fn get_mut(&mut self, family: AddressFamily) -> &mut T {
        match family {
            AddressFamily::V4 => &mut self.ipv4,
            AddressFamily::V6 => &mut self.ipv6,
        }
    }
}

/// CIDR ranges the provider publishes, per family.
pub type DesiredState = PerFamily<BTreeSet<String>>;

/// Rules currently present in the firewall, per family.
pub type ObservedState = PerFamily<RuleSet>;

/// One ingress entry as read from the firewall: a TCP port plus the ranges
/// it allows for each family. A single entry may bundle many ranges, and an
/// empty range list for a family is simply an empty contribution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleEntry {
    pub port: u16,
    pub ipv4_ranges: Vec<String>,
    pub ipv6_ranges: Vec<String>,
}

/// The add/remove plan produced by reconciliation.
///
/// Invariant: for every family, `add` and `remove` are disjoint — together
/// they are exactly the symmetric difference of desired and observed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub add: PerFamily<RuleSet>,
    pub remove: PerFamily<RuleSet>,
}

impl ChangeSet {
    /// True when the firewall already matches the desired state.
    pub fn is_empty(&self) -> bool {
        self.add_count() == 0 && self.remove_count() == 0
    }

    pub fn add_count(&self) -> usize {
        AddressFamily::ALL
            .iter()
            .map(|&f| self.add.get(f).len())
            .sum()
    }

    pub fn remove_count(&self) -> usize {
        AddressFamily::ALL
            .iter()
            .map(|&f| self.remove.get(f).len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_ordering_deterministic() {
        let mut set = RuleSet::new();
        set.insert(Rule::new("104.24.0.0/14", 80));
        set.insert(Rule::new("104.16.0.0/12", 443));
        set.insert(Rule::new("104.16.0.0/12", 80));

        let rules: Vec<_> = set.iter().cloned().collect();
        assert_eq!(rules[0], Rule::new("104.16.0.0/12", 80));
        assert_eq!(rules[1], Rule::new("104.16.0.0/12", 443));
        assert_eq!(rules[2], Rule::new("104.24.0.0/14", 80));
    }

    #[test]
    fn test_ruleset_deduplicates() {
        let mut set = RuleSet::new();
        set.insert(Rule::new("10.0.0.0/8", 80));
        set.insert(Rule::new("10.0.0.0/8", 80));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_per_family_access() {
        let mut counts = PerFamily::<usize>::default();
        *counts.get_mut(AddressFamily::V4) = 3;
        *counts.get_mut(AddressFamily::V6) = 7;
        assert_eq!(*counts.get(AddressFamily::V4), 3);
        assert_eq!(*counts.get(AddressFamily::V6), 7);
    }

    #[test]
    fn test_changeset_counts() {
        let mut changes = ChangeSet::default();
        assert!(changes.is_empty());

        changes
            .add
            .get_mut(AddressFamily::V4)
            .insert(Rule::new("104.16.0.0/12", 80));
        changes
            .remove
            .get_mut(AddressFamily::V6)
            .insert(Rule::new("2400:cb00::/32", 443));

        assert!(!changes.is_empty());
        assert_eq!(changes.add_count(), 1);
        assert_eq!(changes.remove_count(), 1);
    }

    #[test]
    fn test_family_display() {
        assert_eq!(AddressFamily::V4.to_string(), "ipv4");
        assert_eq!(AddressFamily::V6.to_string(), "ipv6");
    }
}
