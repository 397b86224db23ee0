//! Outbound Ports (Driven Ports / SPI)
//!
//! The member store is an external collaborator offering point reads, point
//! writes and query-by-field. Placement and aggregation only ever issue one
//! batched query per BFS frontier.

use crate::domain::entities::Member;
use crate::domain::errors::{LedgerError, StoreError};
use async_trait::async_trait;
use shared_types::{Amount, MemberId, Timestamp};

/// Lookup of already-issued codes.
#[async_trait]
pub trait CodeDirectory: Send + Sync {
    /// Whether `code` is held by any member as a sponsor or trace code.
    async fn code_in_use(&self, code: &str) -> Result<bool, StoreError>;
}

/// Persistent member storage.
///
/// Keeps two indexed adjacency relations: placement parent → children
/// ordered by slot, and sponsor → referrals ordered by join.
#[async_trait]
pub trait MemberStore: CodeDirectory {
    async fn get(&self, id: MemberId) -> Result<Option<Member>, StoreError>;

    async fn find_by_sponsor_code(&self, code: &str) -> Result<Option<Member>, StoreError>;

    /// Case-insensitive.
    async fn find_by_username(&self, username: &str) -> Result<Option<Member>, StoreError>;

    async fn root(&self) -> Result<Option<Member>, StoreError>;

    /// Placement children of every parent in `parents`.
    ///
    /// Grouped by parent in the order given, each group ordered by slot.
    async fn children_of(&self, parents: &[MemberId]) -> Result<Vec<Member>, StoreError>;

    /// Direct referrals of every sponsor in `sponsors`.
    ///
    /// Grouped by sponsor in the order given, each group in join order.
    async fn referrals_of(&self, sponsors: &[MemberId]) -> Result<Vec<Member>, StoreError>;

    /// Persist a new member, claiming its placement slot atomically.
    ///
    /// For a non-root member the insert fails with `SlotTaken` if the slot is
    /// occupied, `ParentFull` if the parent already has `matrix_width`
    /// children, and `SlotOutOfRange` if the slot is not below the width.
    /// Codes, usernames and the root are unique.
    async fn insert_member(&self, member: Member, matrix_width: u32) -> Result<(), StoreError>;

    async fn update_self_investment(&self, id: MemberId, total: Amount) -> Result<(), StoreError>;

    /// Re-sum the self investment of `id`'s direct referrals into its cached
    /// `direct_business_total` as one atomic step, and return the new total.
    async fn recompute_direct_business(&self, id: MemberId) -> Result<Amount, StoreError>;

    async fn set_active(&self, id: MemberId, active: bool) -> Result<(), StoreError>;

    /// Every member in join order.
    async fn snapshot(&self) -> Result<Vec<Member>, StoreError>;
}

/// Read path of the investment ledger.
#[async_trait]
pub trait InvestmentLedger: Send + Sync {
    /// Sum of the member's active investments. Zero when none.
    async fn active_investment_total(&self, member_id: MemberId) -> Result<Amount, LedgerError>;
}

/// Time source for join timestamps.
///
/// Abstracted to allow testing with deterministic time.
pub trait TimeSource: Send + Sync {
    /// Returns the current timestamp in seconds.
    fn now(&self) -> Timestamp;
}
