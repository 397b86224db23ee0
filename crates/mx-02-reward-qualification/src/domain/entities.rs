//! Core entities for reward qualification

use super::errors::QualificationError;
use serde::{Deserialize, Serialize};
use shared_types::{
    Amount, Decimal, MemberId, RewardDefinitionId, RewardRecordId, RewardStatus, Timestamp,
};

fn default_true() -> bool {
    true
}

fn default_version() -> u32 {
    1
}

/// A reward offered by the catalog.
///
/// Edits bump `version` and only affect future qualification checks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardDefinition {
    pub id: RewardDefinitionId,
    /// Unique key, e.g. `bronze`.
    pub reward_type: String,
    pub name: String,
    pub self_invest_target: Amount,
    pub direct_business_target: Amount,
    pub reward_value: Amount,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default = "default_version")]
    pub version: u32,
}

impl RewardDefinition {
    pub fn validate(&self) -> Result<(), QualificationError> {
        let invalid = |reason: &str| {
            Err(QualificationError::InvalidDefinition {
                reward_type: self.reward_type.clone(),
                reason: reason.to_string(),
            })
        };

        if self.reward_type.trim().is_empty() {
            return invalid("reward type is blank");
        }
        if self.self_invest_target <= Amount::ZERO || self.direct_business_target <= Amount::ZERO {
            return invalid("targets must be strictly positive");
        }
        if self.reward_value < Amount::ZERO {
            return invalid("reward value is negative");
        }
        Ok(())
    }
}

/// Inputs to a qualification check for one member.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberMetrics {
    pub member_id: MemberId,
    pub active: bool,
    pub self_investment: Amount,
    pub direct_business: Amount,
}

/// Progress toward one reward, each ratio clamped to `[0, 1]`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardProgress {
    pub definition_id: RewardDefinitionId,
    pub reward_type: String,
    pub self_invest_progress: Decimal,
    pub direct_business_progress: Decimal,
    /// Either threshold is met.
    pub eligible: bool,
    /// Status of the member's record for this reward, if one exists.
    pub status: Option<RewardStatus>,
}

/// Issued reward. At most one per `(member_id, reward_type)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardRecord {
    pub id: RewardRecordId,
    pub member_id: MemberId,
    pub reward_definition_id: RewardDefinitionId,
    pub reward_type: String,
    /// Catalog version the member qualified against.
    pub definition_version: u32,
    pub reward_value: Amount,
    pub self_invest_achieved: Amount,
    pub direct_business_achieved: Amount,
    pub qualification_date: Timestamp,
    pub status: RewardStatus,
    pub notes: Option<String>,
    pub approved_at: Option<Timestamp>,
    pub processed_at: Option<Timestamp>,
}

impl RewardRecord {
    /// New `qualified` record snapshotting the achieved values.
    pub fn qualify(definition: &RewardDefinition, metrics: &MemberMetrics, now: Timestamp) -> Self {
        Self {
            id: RewardRecordId::new(),
            member_id: metrics.member_id,
            reward_definition_id: definition.id,
            reward_type: definition.reward_type.clone(),
            definition_version: definition.version,
            reward_value: definition.reward_value,
            self_invest_achieved: metrics.self_investment,
            direct_business_achieved: metrics.direct_business,
            qualification_date: now,
            status: RewardStatus::Qualified,
            notes: None,
            approved_at: None,
            processed_at: None,
        }
    }

    /// Advance the state machine.
    ///
    /// Rejection requires non-blank notes. Notes given on other transitions
    /// replace the stored notes.
    pub fn transition_to(
        &mut self,
        next: RewardStatus,
        notes: Option<String>,
        now: Timestamp,
    ) -> Result<(), QualificationError> {
        if !self.status.can_transition_to(next) {
            return Err(QualificationError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }

        let notes = notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        if next == RewardStatus::Rejected && notes.is_none() {
            return Err(QualificationError::NotesRequired);
        }

        match next {
            RewardStatus::Approved => self.approved_at = Some(now),
            RewardStatus::Processed => self.processed_at = Some(now),
            RewardStatus::Qualified | RewardStatus::Rejected => {}
        }
        if notes.is_some() {
            self.notes = notes;
        }
        self.status = next;
        Ok(())
    }
}

/// Result of checking one definition for one member.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualificationOutcome {
    /// A record was created by this evaluation.
    Qualified(RewardRecord),
    /// The member already holds a record for this reward type.
    AlreadyHeld {
        reward_type: String,
        status: RewardStatus,
    },
    NotYetEligible(RewardProgress),
}

impl QualificationOutcome {
    pub fn reward_type(&self) -> &str {
        match self {
            Self::Qualified(record) => &record.reward_type,
            Self::AlreadyHeld { reward_type, .. } => reward_type,
            Self::NotYetEligible(progress) => &progress.reward_type,
        }
    }
}

/// Outcomes of evaluating every active definition for a member.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub member_id: MemberId,
    pub outcomes: Vec<QualificationOutcome>,
}

impl EvaluationReport {
    pub fn newly_qualified(&self) -> impl Iterator<Item = &RewardRecord> {
        self.outcomes.iter().filter_map(|o| match o {
            QualificationOutcome::Qualified(record) => Some(record),
            _ => None,
        })
    }
}

/// Totals of a catch-up pass over every invested member.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub evaluated: usize,
    /// Members issued at least one new record.
    pub qualified: usize,
    pub failed: usize,
}
