//! Filtering of the VLAN snapshot.

use crate::scanner::{VlanAssignment, VlanInventory};
use serde::Serialize;

/// What the operator asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VlanFilter {
    /// Every assignment
    All,
    /// Assignments whose VLAN id equals this text exactly
    Vlan(String),
}

impl VlanFilter {
    /// Parse operator input. `all` (any case) selects everything; anything
    /// else is an exact VLAN id.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        if input.eq_ignore_ascii_case("all") {
            VlanFilter::All
        } else {
            VlanFilter::Vlan(input.to_string())
        }
    }
}

impl std::fmt::Display for VlanFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VlanFilter::All => write!(f, "all"),
            VlanFilter::Vlan(id) => write!(f, "{id}"),
        }
    }
}

/// How many assignments carry one VLAN id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VlanCount {
    pub vlan_id: String,
    pub count: usize,
}

/// Outcome of a query. The three shapes never overlap.
#[derive(Debug, PartialEq, Eq)]
pub enum QueryResult<'a> {
    /// Non-empty subset matching a specific VLAN id
    Matches(Vec<&'a VlanAssignment>),
    /// The whole snapshot
    All(&'a [VlanAssignment]),
    /// Nothing matched; every known VLAN id with its count, in first-seen order
    NoMatch(Vec<VlanCount>),
}

impl<'a> QueryResult<'a> {
    /// The assignments to show or resolve, if this is not a miss.
    pub fn assignments(&self) -> Option<Vec<&'a VlanAssignment>> {
        match self {
            QueryResult::Matches(matches) => Some(matches.clone()),
            QueryResult::All(all) => Some(all.iter().collect()),
            QueryResult::NoMatch(_) => None,
        }
    }
}

/// Filter the snapshot, falling back to a VLAN census when nothing matches.
pub fn query<'a>(inventory: &'a VlanInventory, filter: &VlanFilter) -> QueryResult<'a> {
    let vlan_id = match filter {
        VlanFilter::All => return QueryResult::All(inventory.assignments()),
        VlanFilter::Vlan(vlan_id) => vlan_id,
    };

    let matches: Vec<&VlanAssignment> = inventory
        .assignments()
        .iter()
        .filter(|a| &a.vlan_id == vlan_id)
        .collect();

    if matches.is_empty() {
        tracing::debug!("No assignments for VLAN {}", vlan_id);
        QueryResult::NoMatch(vlan_counts(inventory.assignments()))
    } else {
        QueryResult::Matches(matches)
    }
}

/// Count assignments per VLAN id, keeping the order ids first appear in.
pub fn vlan_counts(assignments: &[VlanAssignment]) -> Vec<VlanCount> {
    let mut counts: Vec<VlanCount> = Vec::new();

    for assignment in assignments {
        match counts.iter_mut().find(|c| c.vlan_id == assignment.vlan_id) {
            Some(existing) => existing.count += 1,
            None => counts.push(VlanCount {
                vlan_id: assignment.vlan_id.clone(),
                count: 1,
            }),
        }
    }

    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inventory(rows: &[(&str, &str, &str)]) -> VlanInventory {
        VlanInventory::new(
            rows.iter()
                .map(|(switch, interface, vlan)| VlanAssignment {
                    switch_address: switch.to_string(),
                    interface: interface.to_string(),
                    vlan_id: vlan.to_string(),
                })
                .collect(),
        )
    }

    fn sample() -> VlanInventory {
        inventory(&[
            ("10.0.0.1", "Gi0/1", "10"),
            ("10.0.0.1", "Gi0/2", "20"),
            ("10.0.0.2", "Gi0/1", "10"),
            ("10.0.0.2", "Gi0/7", "010"),
        ])
    }

    #[test]
    fn test_filter_parse() {
        assert_eq!(VlanFilter::parse(" all "), VlanFilter::All);
        assert_eq!(VlanFilter::parse("ALL"), VlanFilter::All);
        assert_eq!(VlanFilter::parse("10\n"), VlanFilter::Vlan("10".to_string()));
    }

    #[test]
    fn test_specific_vlan_returns_exact_subset() {
        let inv = sample();
        let QueryResult::Matches(matches) = query(&inv, &VlanFilter::parse("10")) else {
            panic!("expected matches");
        };
        let found: Vec<(&str, &str)> = matches
            .iter()
            .map(|a| (a.switch_address.as_str(), a.interface.as_str()))
            .collect();
        // "010" is a different VLAN id as far as text matching goes
        assert_eq!(found, vec![("10.0.0.1", "Gi0/1"), ("10.0.0.2", "Gi0/1")]);
    }

    #[test]
    fn test_all_returns_everything() {
        let inv = sample();
        let result = query(&inv, &VlanFilter::All);
        assert_eq!(result, QueryResult::All(inv.assignments()));
        assert_eq!(result.assignments().map(|a| a.len()), Some(4));
    }

    #[test]
    fn test_miss_returns_counts() {
        let inv = inventory(&[("s1", "Gi0/1", "10"), ("s1", "Gi0/2", "20")]);
        let result = query(&inv, &VlanFilter::parse("99"));
        assert_eq!(
            result,
            QueryResult::NoMatch(vec![
                VlanCount { vlan_id: "10".to_string(), count: 1 },
                VlanCount { vlan_id: "20".to_string(), count: 1 },
            ])
        );
        assert_eq!(result.assignments(), None);
    }

    #[test]
    fn test_counts_sum_to_snapshot_size() {
        let inv = sample();
        let QueryResult::NoMatch(counts) = query(&inv, &VlanFilter::parse("4094")) else {
            panic!("expected census");
        };
        assert_eq!(counts.iter().map(|c| c.count).sum::<usize>(), inv.len());
        assert_eq!(counts[0], VlanCount { vlan_id: "10".to_string(), count: 2 });
    }

    #[test]
    fn test_blank_filter_shows_counts() {
        let inv = sample();
        let QueryResult::NoMatch(counts) = query(&inv, &VlanFilter::parse("  ")) else {
            panic!("expected census");
        };
        assert_eq!(counts.len(), 3);
    }

    #[test]
    fn test_empty_snapshot() {
        let inv = inventory(&[]);
        assert_eq!(query(&inv, &VlanFilter::parse("10")), QueryResult::NoMatch(vec![]));
        assert_eq!(query(&inv, &VlanFilter::All), QueryResult::All(&[]));
    }
}
