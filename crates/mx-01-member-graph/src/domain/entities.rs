//! Core entities for the member graph
//!
//! A member sits in two structures at once: the sponsor graph (who referred
//! whom) and the placement matrix (capacity-bounded N-ary tree).

use serde::{Deserialize, Serialize};
use shared_types::{Amount, MemberId, Timestamp};

/// A network member.
///
/// `sponsor_id` and `placement_parent_id` are independent pointers: the
/// sponsor is whoever referred the member, the placement parent is the node
/// the placement resolver found spare capacity under.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub username: String,
    /// `None` only for the root.
    pub sponsor_id: Option<MemberId>,
    /// `None` only for the root.
    pub placement_parent_id: Option<MemberId>,
    /// Index among the placement parent's children, `0..matrix_width`.
    pub placement_slot: u32,
    pub sponsor_code: String,
    pub trace_code: String,
    /// Cached projection of the investment ledger.
    pub self_investment_total: Amount,
    /// Cached sum of direct referrals' self investment.
    pub direct_business_total: Amount,
    pub is_root: bool,
    pub active: bool,
    pub joined_at: Timestamp,
}

impl Member {
    /// Build the root member. The root has no sponsor and no placement parent.
    pub fn root(
        username: impl Into<String>,
        sponsor_code: String,
        trace_code: String,
        joined_at: Timestamp,
    ) -> Self {
        Self {
            id: MemberId::new(),
            username: username.into(),
            sponsor_id: None,
            placement_parent_id: None,
            placement_slot: 0,
            sponsor_code,
            trace_code,
            self_investment_total: Amount::ZERO,
            direct_business_total: Amount::ZERO,
            is_root: true,
            active: true,
            joined_at,
        }
    }

    /// Build a non-root member placed under `placement.parent_id`.
    pub fn placed(
        username: impl Into<String>,
        sponsor_id: MemberId,
        placement: &PlacementDecision,
        codes: IssuedCodes,
        joined_at: Timestamp,
    ) -> Self {
        Self {
            id: MemberId::new(),
            username: username.into(),
            sponsor_id: Some(sponsor_id),
            placement_parent_id: Some(placement.parent_id),
            placement_slot: placement.slot,
            sponsor_code: codes.sponsor_code,
            trace_code: codes.trace_code,
            self_investment_total: Amount::ZERO,
            direct_business_total: Amount::ZERO,
            is_root: false,
            active: true,
            joined_at,
        }
    }
}

/// Sponsor and trace codes issued together for one signup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssuedCodes {
    pub sponsor_code: String,
    pub trace_code: String,
}

/// Result of a placement search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlacementDecision {
    pub parent_id: MemberId,
    /// Smallest unused slot under `parent_id`.
    pub slot: u32,
    /// Levels below the sponsor that were searched (0 = sponsor itself).
    pub depth: u32,
}

/// Signup input from the outer service layer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    /// `root`, a sponsor code, or a sponsor username. Blank when omitted.
    pub sponsor_reference: String,
}

/// Signup output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupReceipt {
    pub member_id: MemberId,
    pub sponsor_id: Option<MemberId>,
    pub sponsor_code: String,
    pub trace_code: String,
    pub placement_parent_id: Option<MemberId>,
    pub placement_slot: u32,
}

impl From<&Member> for SignupReceipt {
    fn from(member: &Member) -> Self {
        Self {
            member_id: member.id,
            sponsor_id: member.sponsor_id,
            sponsor_code: member.sponsor_code.clone(),
            trace_code: member.trace_code.clone(),
            placement_parent_id: member.placement_parent_id,
            placement_slot: member.placement_slot,
        }
    }
}

/// One level of a downline walk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSummary {
    /// 1 = direct referrals.
    pub level: u32,
    pub members: u64,
    pub investment: Amount,
}

/// Why a downline walk stopped early.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Truncation {
    /// The traversal depth guard was reached with members still below it.
    DepthLimit { max_depth: u32 },
    /// The node budget ran out.
    NodeLimit { max_nodes: u64 },
}

/// Aggregated metrics over a member's sponsor downline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownlineAggregates {
    pub member_id: MemberId,
    /// Members reached, excluding the member itself.
    pub team_size: u64,
    pub team_investment: Amount,
    pub direct_count: u64,
    pub direct_business: Amount,
    pub levels: Vec<LevelSummary>,
    pub levels_traversed: u32,
    pub truncated: Option<Truncation>,
}

impl DownlineAggregates {
    pub fn empty(member_id: MemberId) -> Self {
        Self {
            member_id,
            team_size: 0,
            team_investment: Amount::ZERO,
            direct_count: 0,
            direct_business: Amount::ZERO,
            levels: Vec::new(),
            levels_traversed: 0,
            truncated: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.truncated.is_none()
    }

    /// Reject a partial result.
    pub fn require_complete(self) -> Result<Self, super::errors::NetworkError> {
        match self.truncated {
            None => Ok(self),
            Some(_) => Err(super::errors::NetworkError::AggregationDepthExceeded {
                member_id: self.member_id,
                levels_traversed: self.levels_traversed,
            }),
        }
    }
}

/// Outcome of recomputing a member's cached investment projections.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestmentRefresh {
    pub member_id: MemberId,
    pub self_investment_total: Amount,
    pub sponsor_id: Option<MemberId>,
    /// The sponsor's recomputed direct business, when there is a sponsor.
    pub sponsor_direct_business: Option<Amount>,
    /// Members whose aggregates may have changed.
    pub affected_members: Vec<MemberId>,
}

/// A structural problem found by an audit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StructureViolation {
    NoRoot,
    MultipleRoots(Vec<MemberId>),
    OverCapacity { parent_id: MemberId, children: u32 },
    OrphanPlacement { member_id: MemberId, parent_id: Option<MemberId> },
    MissingSponsor { member_id: MemberId, sponsor_id: Option<MemberId> },
    SlotOutOfRange { member_id: MemberId, slot: u32 },
    DuplicateSlot { parent_id: MemberId, slot: u32 },
}

/// Result of `audit_structure`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureReport {
    pub members_checked: usize,
    pub violations: Vec<StructureViolation>,
}

impl StructureReport {
    pub fn is_healthy(&self) -> bool {
        self.violations.is_empty()
    }
}
