//! Placement resolution
//!
//! Breadth-first search over the placement tree rooted at the sponsor. The
//! sponsor is checked first, then each level in slot order, issuing one
//! `children_of` query per frontier. The first node with fewer than
//! `matrix_width` children wins, which gives depth-then-left-to-right
//! filling.

use crate::domain::entities::{Member, PlacementDecision};
use crate::domain::errors::NetworkError;
use crate::ports::outbound::MemberStore;
use shared_types::MemberId;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Smallest slot index in `0..matrix_width` not present in `taken`.
pub fn next_free_slot(taken: &[u32], matrix_width: u32) -> Option<u32> {
    (0..matrix_width).find(|slot| !taken.contains(slot))
}

/// Find the placement parent and slot for a new member of `sponsor_id`.
///
/// # Errors
///
/// - `InvalidConfiguration` when `matrix_width` is zero
/// - `InvalidSponsor` when the sponsor does not exist
/// - `PlacementExhausted` when the frontier empties or `max_levels` is hit
///   without finding spare capacity
pub async fn resolve_placement(
    store: &dyn MemberStore,
    sponsor_id: MemberId,
    matrix_width: u32,
    max_levels: u32,
) -> Result<PlacementDecision, NetworkError> {
    if matrix_width == 0 {
        return Err(NetworkError::InvalidConfiguration(
            "matrix width must be at least 1".into(),
        ));
    }

    if store.get(sponsor_id).await?.is_none() {
        return Err(NetworkError::InvalidSponsor {
            reference: sponsor_id.to_string(),
        });
    }

    let mut frontier = vec![sponsor_id];
    let mut visited: HashSet<MemberId> = HashSet::from([sponsor_id]);
    let mut depth = 0u32;

    while !frontier.is_empty() && depth <= max_levels {
        let children = store.children_of(&frontier).await?;
        let slots = slots_by_parent(&children);

        for parent_id in &frontier {
            let taken = slots.get(parent_id).map(Vec::as_slice).unwrap_or(&[]);
            if taken.len() >= matrix_width as usize {
                continue;
            }
            if let Some(slot) = next_free_slot(taken, matrix_width) {
                debug!(%sponsor_id, %parent_id, slot, depth, "Placement resolved");
                return Ok(PlacementDecision {
                    parent_id: *parent_id,
                    slot,
                    depth,
                });
            }
        }

        frontier = children
            .into_iter()
            .map(|child| child.id)
            .filter(|id| visited.insert(*id))
            .collect();
        depth += 1;
    }

    Err(NetworkError::PlacementExhausted {
        sponsor_id,
        levels: depth,
    })
}

fn slots_by_parent(children: &[Member]) -> HashMap<MemberId, Vec<u32>> {
    let mut slots: HashMap<MemberId, Vec<u32>> = HashMap::new();
    for child in children {
        if let Some(parent) = child.placement_parent_id {
            slots.entry(parent).or_default().push(child.placement_slot);
        }
    }
    slots
}
