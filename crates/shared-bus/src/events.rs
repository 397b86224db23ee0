//! # Network Events
//!
//! Defines all event types that flow through the shared bus.

use crate::subsystem_ids;
use serde::{Deserialize, Serialize};
use shared_types::{Amount, MemberId, RewardRecordId, RewardStatus};

/// All events that can be published to the event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NetworkEvent {
    // =========================================================================
    // SUBSYSTEM 1: MEMBER GRAPH
    // =========================================================================
    /// A member was persisted with both graph pointers.
    MemberJoined {
        member_id: MemberId,
        /// `None` only for the root member.
        sponsor_id: Option<MemberId>,
        placement_parent_id: Option<MemberId>,
        placement_slot: u32,
    },

    /// A member was soft-disabled.
    MemberDeactivated { member_id: MemberId },

    /// Cached investment projections were recomputed from the ledger.
    /// **CHOREOGRAPHY:** Triggers reward re-evaluation for `affected_members`.
    InvestmentTotalsRefreshed {
        member_id: MemberId,
        self_investment_total: Amount,
        /// Members whose aggregates may have changed (the member and its sponsor).
        affected_members: Vec<MemberId>,
    },

    // =========================================================================
    // SUBSYSTEM 2: REWARD QUALIFICATION
    // =========================================================================
    /// A member satisfied a reward condition for the first time.
    RewardQualified {
        record_id: RewardRecordId,
        member_id: MemberId,
        reward_type: String,
    },

    /// An administrator moved a reward record through the state machine.
    RewardStatusChanged {
        record_id: RewardRecordId,
        member_id: MemberId,
        from: RewardStatus,
        to: RewardStatus,
    },

    // =========================================================================
    // CRITICAL EVENTS
    // =========================================================================
    /// Critical error requiring operator attention.
    CriticalError {
        /// The subsystem that encountered the error.
        subsystem_id: u8,
        /// Error description.
        error: String,
    },
}

impl NetworkEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::MemberJoined { .. } | Self::MemberDeactivated { .. } => EventTopic::Membership,
            Self::InvestmentTotalsRefreshed { .. } => EventTopic::Investment,
            Self::RewardQualified { .. } | Self::RewardStatusChanged { .. } => EventTopic::Rewards,
            Self::CriticalError { .. } => EventTopic::Critical,
        }
    }

    /// Get the originating subsystem ID.
    #[must_use]
    pub fn source_subsystem(&self) -> u8 {
        match self {
            Self::MemberJoined { .. }
            | Self::MemberDeactivated { .. }
            | Self::InvestmentTotalsRefreshed { .. } => subsystem_ids::MEMBER_GRAPH,
            Self::RewardQualified { .. } | Self::RewardStatusChanged { .. } => {
                subsystem_ids::REWARD_QUALIFICATION
            }
            Self::CriticalError { subsystem_id, .. } => *subsystem_id,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Signup and membership lifecycle.
    Membership,
    /// Investment projection refreshes.
    Investment,
    /// Reward qualification and administration.
    Rewards,
    /// Critical errors.
    Critical,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Source subsystems to include. Empty means all sources.
    pub source_subsystems: Vec<u8>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            source_subsystems: Vec::new(),
        }
    }

    /// Create a filter for events from specific subsystems.
    #[must_use]
    pub fn from_subsystems(subsystems: Vec<u8>) -> Self {
        Self {
            topics: Vec::new(),
            source_subsystems: subsystems,
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &NetworkEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let source_match = self.source_subsystems.is_empty()
            || self.source_subsystems.contains(&event.source_subsystem());

        topic_match && source_match
    }
}
