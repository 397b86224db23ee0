//! Sponsor graph walks
//!
//! Downline aggregation descends the sponsor graph level by level with an
//! explicit frontier, one `referrals_of` query per level. Ancestor walks go
//! up one sponsor pointer at a time.

use crate::domain::entities::{DownlineAggregates, LevelSummary, Member, Truncation};
use crate::domain::errors::NetworkError;
use crate::ports::outbound::MemberStore;
use shared_types::{Amount, MemberId};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Bounds for a downline walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraversalLimits {
    /// Caller-requested depth. `None` or `Some(0)` means unbounded.
    pub max_depth: Option<u32>,
    /// Depth guard applied when the requested depth is unbounded or larger.
    pub depth_guard: u32,
    /// Maximum members counted before stopping.
    pub max_nodes: u64,
}

impl TraversalLimits {
    fn effective_depth(&self) -> (u32, bool) {
        match self.max_depth {
            Some(depth) if depth > 0 && depth <= self.depth_guard => (depth, false),
            _ => (self.depth_guard, true),
        }
    }
}

/// Aggregate team size and investment over a member's sponsor downline.
///
/// Missing investments count as zero. A visited set keeps every member
/// counted at most once. When the depth guard or node budget stops the walk
/// early the result carries a `truncated` marker.
pub async fn compute_downline_aggregates(
    store: &dyn MemberStore,
    member_id: MemberId,
    limits: TraversalLimits,
) -> Result<DownlineAggregates, NetworkError> {
    if store.get(member_id).await?.is_none() {
        return Err(NetworkError::MemberNotFound(member_id));
    }

    let (depth_limit, guarded) = limits.effective_depth();
    let mut aggregates = DownlineAggregates::empty(member_id);
    let mut visited: HashSet<MemberId> = HashSet::from([member_id]);
    let mut frontier = vec![member_id];
    let mut level = 0u32;

    while !frontier.is_empty() {
        let referrals = store.referrals_of(&frontier).await?;
        let mut next: Vec<Member> = referrals
            .into_iter()
            .filter(|m| visited.insert(m.id))
            .collect();

        if next.is_empty() {
            break;
        }

        if level == depth_limit {
            // Only the guard counts as truncation; a caller depth is a normal stop
            if guarded {
                aggregates.truncated = Some(Truncation::DepthLimit {
                    max_depth: depth_limit,
                });
            }
            break;
        }

        let remaining = limits.max_nodes.saturating_sub(aggregates.team_size);
        if (next.len() as u64) > remaining {
            next.truncate(remaining as usize);
            aggregates.truncated = Some(Truncation::NodeLimit {
                max_nodes: limits.max_nodes,
            });
        }

        level += 1;
        let investment: Amount = next.iter().map(|m| m.self_investment_total).sum();
        let count = next.len() as u64;

        if level == 1 {
            aggregates.direct_count = count;
            aggregates.direct_business = investment;
        }
        aggregates.team_size += count;
        aggregates.team_investment += investment;
        if count > 0 {
            aggregates.levels.push(LevelSummary {
                level,
                members: count,
                investment,
            });
        }

        if aggregates.truncated.is_some() {
            break;
        }
        frontier = next.into_iter().map(|m| m.id).collect();
    }

    aggregates.levels_traversed = aggregates.levels.len() as u32;

    if let Some(truncation) = aggregates.truncated {
        warn!(%member_id, ?truncation, levels = aggregates.levels_traversed, "Downline walk truncated");
    } else {
        debug!(
            %member_id,
            team_size = aggregates.team_size,
            levels = aggregates.levels_traversed,
            "Downline aggregated"
        );
    }

    Ok(aggregates)
}

/// Sponsor chain above `member_id`, nearest first.
///
/// Stops at the root, at `max_depth` hops, or on a pointer that was already
/// seen.
pub async fn sponsor_ancestors(
    store: &dyn MemberStore,
    member_id: MemberId,
    max_depth: u32,
) -> Result<Vec<Member>, NetworkError> {
    let member = store
        .get(member_id)
        .await?
        .ok_or(NetworkError::MemberNotFound(member_id))?;

    let mut chain = Vec::new();
    let mut seen: HashSet<MemberId> = HashSet::from([member_id]);
    let mut next = member.sponsor_id;

    while let Some(sponsor_id) = next {
        if chain.len() as u32 >= max_depth || !seen.insert(sponsor_id) {
            break;
        }
        let Some(sponsor) = store.get(sponsor_id).await? else {
            warn!(%member_id, %sponsor_id, "Sponsor chain points at a missing member");
            break;
        };
        next = sponsor.sponsor_id;
        chain.push(sponsor);
    }

    Ok(chain)
}
