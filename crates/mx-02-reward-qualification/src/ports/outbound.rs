//! Outbound Ports (Driven Ports / SPI)

use crate::domain::entities::{MemberMetrics, RewardDefinition, RewardRecord};
use crate::domain::errors::{CatalogError, QualificationError, RecordStoreError};
use async_trait::async_trait;
use shared_types::{MemberId, RewardDefinitionId, RewardRecordId, RewardStatus};

/// Source of reward definitions.
#[async_trait]
pub trait RewardCatalog: Send + Sync {
    /// Active definitions ordered by id.
    async fn active_definitions(&self) -> Result<Vec<RewardDefinition>, CatalogError>;

    async fn get(&self, id: RewardDefinitionId) -> Result<Option<RewardDefinition>, CatalogError>;
}

/// Result of an idempotent insert.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A record for the same member and reward type already exists.
    AlreadyExists(RewardRecord),
}

/// Persistent reward records.
///
/// Holds at most one record per `(member_id, reward_type)`.
#[async_trait]
pub trait RewardRecordStore: Send + Sync {
    /// Insert unless the member already holds this reward type.
    async fn insert_if_absent(&self, record: RewardRecord)
        -> Result<InsertOutcome, RecordStoreError>;

    async fn get(&self, id: RewardRecordId) -> Result<Option<RewardRecord>, RecordStoreError>;

    async fn find(
        &self,
        member_id: MemberId,
        reward_type: &str,
    ) -> Result<Option<RewardRecord>, RecordStoreError>;

    /// Records of a member ordered by qualification date.
    async fn list_for_member(&self, member_id: MemberId)
        -> Result<Vec<RewardRecord>, RecordStoreError>;

    /// Replace the stored record if its status still equals `expected`.
    ///
    /// Fails with `StatusMismatch` carrying the stored status otherwise.
    async fn compare_and_set(
        &self,
        record: RewardRecord,
        expected: RewardStatus,
    ) -> Result<(), RecordStoreError>;
}

/// Current qualification inputs for a member.
#[async_trait]
pub trait MemberMetricsProvider: Send + Sync {
    async fn metrics(&self, member_id: MemberId) -> Result<MemberMetrics, QualificationError>;

    /// Every member that could satisfy a reward target.
    async fn candidates(&self) -> Result<Vec<MemberId>, QualificationError>;
}
