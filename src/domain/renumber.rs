//! Renumbering plan for the active fleet.
//!
//! After bins are retired the survivors are reassigned the identifiers
//! `"001"..="00N"` in ascending order of their current numeric identifier.
//! The plan only lists bins whose identifier actually changes, so applying
//! it to an already contiguous fleet is a no-op.

use serde::Serialize;

use super::DustbinId;

/// A single identifier change produced by [`plan_renumbering`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reassignment {
    /// Identifier before renumbering.
    pub from: DustbinId,
    /// Identifier after renumbering.
    pub to: DustbinId,
}

/// Computes the reassignments that make `active` contiguous.
///
/// `active` may be in any order; it is sorted by numeric identifier
/// (non-numeric identifiers sort last, by string) before positions are
/// assigned. The returned list is in application order: because each new
/// identifier is never greater than the old one, applying the entries in
/// sequence never targets an identifier still held by an unprocessed bin.
#[must_use]
pub fn plan_renumbering(active: &[DustbinId]) -> Vec<Reassignment> {
    let mut ordered: Vec<&DustbinId> = active.iter().collect();
    ordered.sort_by(|a, b| match (a.position(), b.position()) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.cmp(b),
    });

    ordered
        .into_iter()
        .zip(1u32..)
        .filter_map(|(current, position)| {
            let target = DustbinId::from_position(position);
            (*current != target).then(|| Reassignment {
                from: current.clone(),
                to: target,
            })
        })
        .collect()
}

/// Returns `true` if `ids`, taken as a set, is exactly `"001"..="00N"`.
#[must_use]
pub fn is_contiguous(ids: &[DustbinId]) -> bool {
    let mut positions: Vec<u32> = ids.iter().filter_map(DustbinId::position).collect();
    if positions.len() != ids.len() {
        return false;
    }
    positions.sort_unstable();
    positions.iter().zip(1u32..).all(|(p, expected)| *p == expected)
        && ids
            .iter()
            .all(|id| DustbinId::from_position(id.position().unwrap_or(0)) == *id)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<DustbinId> {
        raw.iter().map(|s| DustbinId::from_raw(*s)).collect()
    }

    fn apply(active: &[DustbinId], plan: &[Reassignment]) -> Vec<DustbinId> {
        active
            .iter()
            .map(|id| {
                plan.iter()
                    .find(|r| r.from == *id)
                    .map_or_else(|| id.clone(), |r| r.to.clone())
            })
            .collect()
    }

    #[test]
    fn contiguous_fleet_needs_no_changes() {
        let active = ids(&["001", "002", "003"]);
        assert!(plan_renumbering(&active).is_empty());
    }

    #[test]
    fn gap_in_the_middle_shifts_tail_down() {
        let active = ids(&["001", "003", "004"]);
        let plan = plan_renumbering(&active);
        assert_eq!(
            plan,
            vec![
                Reassignment {
                    from: DustbinId::from_raw("003"),
                    to: DustbinId::from_raw("002"),
                },
                Reassignment {
                    from: DustbinId::from_raw("004"),
                    to: DustbinId::from_raw("003"),
                },
            ]
        );
    }

    #[test]
    fn ordering_is_numeric_not_lexical() {
        let active = ids(&["1000", "002", "999"]);
        let plan = plan_renumbering(&active);
        let renumbered = apply(&active, &plan);
        assert_eq!(renumbered, ids(&["003", "001", "002"]));
    }

    #[test]
    fn targets_never_exceed_sources() {
        let active = ids(&["010", "004", "007", "002"]);
        for r in plan_renumbering(&active) {
            let (Some(from), Some(to)) = (r.from.position(), r.to.position()) else {
                panic!("sequential ids expected");
            };
            assert!(to < from);
        }
    }

    #[test]
    fn every_deletion_sequence_leaves_contiguous_ids() {
        let mut fleet: Vec<DustbinId> = (1..=12).map(DustbinId::from_position).collect();
        for victim in [5usize, 0, 7, 3, 2] {
            if victim < fleet.len() {
                fleet.remove(victim);
            }
            let plan = plan_renumbering(&fleet);
            fleet = apply(&fleet, &plan);
            assert!(is_contiguous(&fleet), "not contiguous: {fleet:?}");
        }
        assert_eq!(fleet.len(), 7);
    }

    #[test]
    fn is_contiguous_rejects_gaps_and_bad_padding() {
        assert!(is_contiguous(&ids(&["002", "001"])));
        assert!(is_contiguous(&[]));
        assert!(!is_contiguous(&ids(&["001", "003"])));
        assert!(!is_contiguous(&ids(&["1", "002"])));
        assert!(!is_contiguous(&ids(&["001", "001"])));
    }
}
