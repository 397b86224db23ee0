//! # Core Domain Entities
//!
//! Identifiers and value types that cross subsystem boundaries.
//!
//! ## Clusters
//!
//! - **Identity**: `MemberId`, `RewardRecordId`, `RewardDefinitionId`
//! - **Money & Time**: `Amount`, `Timestamp`
//! - **Rewards**: `RewardStatus` state machine vocabulary

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub use rust_decimal::Decimal;

/// Money in the network's single currency unit.
pub type Amount = Decimal;

/// Seconds since UNIX epoch.
pub type Timestamp = u64;

// =============================================================================
// IDENTITY
// =============================================================================

/// Unique, immutable identifier of a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemberId(pub Uuid);

impl MemberId {
    /// Generate a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MemberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an issued reward record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RewardRecordId(pub Uuid);

impl RewardRecordId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RewardRecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RewardRecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a catalog reward definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RewardDefinitionId(pub u32);

impl fmt::Display for RewardDefinitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// REWARD STATUS
// =============================================================================

/// Reward record state machine.
///
/// ```text
/// [Qualified] ──approve──→ [Approved] ──process──→ [Processed]
///      │
///      └── reject ──→ [Rejected]
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardStatus {
    /// Aggregates satisfied the reward condition.
    #[default]
    Qualified,
    /// An administrator approved the payout.
    Approved,
    /// Payout completed.
    Processed,
    /// An administrator refused the payout.
    Rejected,
}

impl RewardStatus {
    /// Check if transition is valid. Only forward, single-step moves are allowed.
    pub fn can_transition_to(&self, next: RewardStatus) -> bool {
        matches!(
            (self, next),
            (Self::Qualified, Self::Approved)
                | (Self::Qualified, Self::Rejected)
                | (Self::Approved, Self::Processed)
        )
    }

    /// Check if terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Processed | Self::Rejected)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Qualified => "qualified",
            Self::Approved => "approved",
            Self::Processed => "processed",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for RewardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
