//! Inbound Ports (Driving Ports / API)

use crate::domain::entities::{
    DownlineAggregates, InvestmentRefresh, Member, SignupReceipt, SignupRequest, StructureReport,
};
use crate::domain::errors::NetworkError;
use async_trait::async_trait;
use shared_types::MemberId;

/// Member Graph API
///
/// Primary interface used by the signup service, the investment ledger's
/// change feed and reward qualification.
#[async_trait]
pub trait MemberGraphApi: Send + Sync {
    /// Create the single root member.
    async fn bootstrap_root(&self, username: &str) -> Result<SignupReceipt, NetworkError>;

    /// Register a member under a sponsor and place it in the matrix.
    async fn register_member(&self, request: SignupRequest)
        -> Result<SignupReceipt, NetworkError>;

    /// Find the placement parent for a new member of `sponsor_id`.
    async fn resolve_placement(
        &self,
        sponsor_id: MemberId,
        matrix_width: u32,
    ) -> Result<MemberId, NetworkError>;

    /// Aggregate the sponsor downline. `max_depth` of `None` or `Some(0)`
    /// means unbounded.
    async fn compute_downline_aggregates(
        &self,
        member_id: MemberId,
        max_depth: Option<u32>,
    ) -> Result<DownlineAggregates, NetworkError>;

    /// Sponsor chain above a member, nearest first.
    async fn sponsor_ancestors(
        &self,
        member_id: MemberId,
        max_depth: Option<u32>,
    ) -> Result<Vec<Member>, NetworkError>;

    /// Recompute cached investment projections from the ledger.
    async fn refresh_investment_totals(
        &self,
        member_id: MemberId,
    ) -> Result<InvestmentRefresh, NetworkError>;

    /// Soft-disable a member.
    async fn deactivate_member(&self, member_id: MemberId) -> Result<(), NetworkError>;

    async fn get_member(&self, member_id: MemberId) -> Result<Member, NetworkError>;

    /// Check the stored structure against the graph invariants.
    async fn audit_structure(&self) -> Result<StructureReport, NetworkError>;

    /// Members with a nonzero cached self investment or direct business
    /// total, in join order. Used to sweep for rewards after lost events.
    async fn invested_members(&self) -> Result<Vec<MemberId>, NetworkError>;
}
