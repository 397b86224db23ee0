//! Inbound Ports (Driving Ports / API)

use crate::domain::entities::{EvaluationReport, RewardProgress, RewardRecord, SweepReport};
use crate::domain::errors::QualificationError;
use async_trait::async_trait;
use shared_types::{MemberId, RewardRecordId};

/// Reward Qualification API
///
/// Used by the investment refresh feed and by administrators.
#[async_trait]
pub trait RewardQualificationApi: Send + Sync {
    /// Check every active reward for a member and issue the ones newly met.
    ///
    /// Idempotent: a reward type already held is never issued twice.
    async fn evaluate_member(&self, member_id: MemberId)
        -> Result<EvaluationReport, QualificationError>;

    /// Evaluate every candidate member. Recovers rewards whose triggering
    /// events were lost; one failed member does not stop the pass.
    async fn evaluate_all(&self) -> Result<SweepReport, QualificationError>;

    /// Progress toward every active reward without issuing anything.
    async fn reward_progress(
        &self,
        member_id: MemberId,
    ) -> Result<Vec<RewardProgress>, QualificationError>;

    /// `qualified -> approved`
    async fn approve(
        &self,
        record_id: RewardRecordId,
        notes: Option<String>,
    ) -> Result<RewardRecord, QualificationError>;

    /// `qualified -> rejected`. Notes are mandatory.
    async fn reject(
        &self,
        record_id: RewardRecordId,
        notes: String,
    ) -> Result<RewardRecord, QualificationError>;

    /// `approved -> processed`
    async fn process(
        &self,
        record_id: RewardRecordId,
        notes: Option<String>,
    ) -> Result<RewardRecord, QualificationError>;

    async fn get_record(&self, record_id: RewardRecordId)
        -> Result<RewardRecord, QualificationError>;

    async fn records_for_member(
        &self,
        member_id: MemberId,
    ) -> Result<Vec<RewardRecord>, QualificationError>;
}
