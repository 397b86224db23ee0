//! Domain invariants for the member graph
//!
//! Each check runs over a store snapshot so it can be used both in tests and
//! by `audit_structure`.

use super::entities::{Member, StructureReport, StructureViolation};
use shared_types::MemberId;
use std::collections::{BTreeMap, HashMap, HashSet};

/// INVARIANT-1: Capacity
/// No placement parent has more than `matrix_width` direct children.
pub fn invariant_capacity(members: &[Member], matrix_width: u32) -> bool {
    child_counts(members)
        .values()
        .all(|count| *count <= matrix_width)
}

/// INVARIANT-2: Single Root
/// Exactly one member is the root, and only the root lacks pointers.
pub fn invariant_single_root(members: &[Member]) -> bool {
    let roots = members.iter().filter(|m| m.is_root).count();
    let pointerless = members
        .iter()
        .filter(|m| m.sponsor_id.is_none() || m.placement_parent_id.is_none())
        .all(|m| m.is_root);
    roots == 1 && pointerless
}

/// INVARIANT-3: No Orphans
/// Every non-root member's sponsor and placement parent exist.
pub fn invariant_no_orphans(members: &[Member]) -> bool {
    let ids: HashSet<MemberId> = members.iter().map(|m| m.id).collect();
    members.iter().filter(|m| !m.is_root).all(|m| {
        m.placement_parent_id.is_some_and(|p| ids.contains(&p))
            && m.sponsor_id.is_some_and(|s| ids.contains(&s))
    })
}

/// INVARIANT-4: Slot Range
pub fn invariant_slot_range(members: &[Member], matrix_width: u32) -> bool {
    members
        .iter()
        .filter(|m| !m.is_root)
        .all(|m| m.placement_slot < matrix_width)
}

/// INVARIANT-5: Unique Slots
/// No two children of the same parent share a slot.
pub fn invariant_unique_slots(members: &[Member]) -> bool {
    let mut seen = HashSet::new();
    members
        .iter()
        .filter_map(|m| m.placement_parent_id.map(|p| (p, m.placement_slot)))
        .all(|key| seen.insert(key))
}

/// Run every check and collect the violations.
pub fn audit(members: &[Member], matrix_width: u32) -> StructureReport {
    let mut violations = Vec::new();
    let ids: HashSet<MemberId> = members.iter().map(|m| m.id).collect();

    let roots: Vec<MemberId> = members.iter().filter(|m| m.is_root).map(|m| m.id).collect();
    match roots.len() {
        0 if !members.is_empty() => violations.push(StructureViolation::NoRoot),
        0 | 1 => {}
        _ => violations.push(StructureViolation::MultipleRoots(roots)),
    }

    // BTreeMap keeps the report order stable
    let counts: BTreeMap<MemberId, u32> = child_counts(members).into_iter().collect();
    for (parent_id, children) in counts {
        if children > matrix_width {
            violations.push(StructureViolation::OverCapacity {
                parent_id,
                children,
            });
        }
    }

    let mut slots = HashSet::new();
    for member in members.iter().filter(|m| !m.is_root) {
        if !member.placement_parent_id.is_some_and(|p| ids.contains(&p)) {
            violations.push(StructureViolation::OrphanPlacement {
                member_id: member.id,
                parent_id: member.placement_parent_id,
            });
        }
        if !member.sponsor_id.is_some_and(|s| ids.contains(&s)) {
            violations.push(StructureViolation::MissingSponsor {
                member_id: member.id,
                sponsor_id: member.sponsor_id,
            });
        }
        if member.placement_slot >= matrix_width {
            violations.push(StructureViolation::SlotOutOfRange {
                member_id: member.id,
                slot: member.placement_slot,
            });
        }
        if let Some(parent_id) = member.placement_parent_id {
            if !slots.insert((parent_id, member.placement_slot)) {
                violations.push(StructureViolation::DuplicateSlot {
                    parent_id,
                    slot: member.placement_slot,
                });
            }
        }
    }

    StructureReport {
        members_checked: members.len(),
        violations,
    }
}

fn child_counts(members: &[Member]) -> HashMap<MemberId, u32> {
    let mut counts: HashMap<MemberId, u32> = HashMap::new();
    for parent in members.iter().filter_map(|m| m.placement_parent_id) {
        *counts.entry(parent).or_insert(0) += 1;
    }
    counts
}
