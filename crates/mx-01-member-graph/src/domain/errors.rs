//! Error types for the member graph

use shared_types::MemberId;
use thiserror::Error;

/// The only failure text a signup caller ever sees.
pub const SIGNUP_FAILURE_MESSAGE: &str = "unable to complete placement";

/// All errors that can occur in the member graph
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Sponsor reference does not resolve to an active member
    #[error("Invalid sponsor: {reference}")]
    InvalidSponsor { reference: String },

    /// Identifier allocator ran out of attempts
    #[error("Code allocation exhausted for prefix {prefix} after {attempts} attempts")]
    AllocationExhausted { prefix: String, attempts: u32 },

    /// Another signup claimed the slot first (retried internally)
    #[error("Slot {slot} under {parent_id} was claimed concurrently")]
    SlotClaimConflict { parent_id: MemberId, slot: u32 },

    /// Slot claim retries exhausted
    #[error("Placement failed after {attempts} attempts")]
    PlacementFailed { attempts: u32 },

    /// No node with spare capacity below the sponsor
    #[error("No placement capacity below {sponsor_id} within {levels} levels")]
    PlacementExhausted { sponsor_id: MemberId, levels: u32 },

    /// Downline walk stopped at a traversal bound
    #[error("Aggregation for {member_id} stopped after {levels_traversed} levels")]
    AggregationDepthExceeded {
        member_id: MemberId,
        levels_traversed: u32,
    },

    #[error("Member not found: {0}")]
    MemberNotFound(MemberId),

    #[error("Root member already exists")]
    RootAlreadyExists,

    #[error("Username already taken: {0}")]
    DuplicateUsername(String),

    #[error("Invalid username: {0:?}")]
    InvalidUsername(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Store or ledger failure
    #[error("Storage error: {0}")]
    Storage(String),
}

impl NetworkError {
    /// Message safe to show to an end user.
    ///
    /// Signup failures collapse to a single generic message; the specific
    /// kind is logged by the service.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::MemberNotFound(_) => "member not found",
            Self::RootAlreadyExists | Self::InvalidConfiguration(_) => "operation not permitted",
            Self::AggregationDepthExceeded { .. } => "downline too large to summarise",
            _ => SIGNUP_FAILURE_MESSAGE,
        }
    }

    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidSponsor { .. } => "invalid_sponsor",
            Self::AllocationExhausted { .. } => "allocation_exhausted",
            Self::SlotClaimConflict { .. } => "slot_claim_conflict",
            Self::PlacementFailed { .. } => "placement_failed",
            Self::PlacementExhausted { .. } => "placement_exhausted",
            Self::AggregationDepthExceeded { .. } => "aggregation_depth_exceeded",
            Self::MemberNotFound(_) => "member_not_found",
            Self::RootAlreadyExists => "root_already_exists",
            Self::DuplicateUsername(_) => "duplicate_username",
            Self::InvalidUsername(_) => "invalid_username",
            Self::InvalidConfiguration(_) => "invalid_configuration",
            Self::Storage(_) => "storage",
        }
    }
}

/// Member store errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Slot {slot} under {parent_id} is taken")]
    SlotTaken { parent_id: MemberId, slot: u32 },

    #[error("Placement parent {parent_id} is full")]
    ParentFull { parent_id: MemberId },

    #[error("Slot {slot} outside matrix width {matrix_width}")]
    SlotOutOfRange { slot: u32, matrix_width: u32 },

    #[error("Code already issued: {0}")]
    DuplicateCode(String),

    #[error("Username already taken: {0}")]
    DuplicateUsername(String),

    #[error("Root member already exists")]
    RootExists,

    #[error("Member not found: {0}")]
    NotFound(MemberId),

    #[error("Store backend failure: {0}")]
    Backend(String),
}

/// Investment ledger errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Investment ledger unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for NetworkError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::SlotTaken { parent_id, slot } => {
                NetworkError::SlotClaimConflict { parent_id, slot }
            }
            StoreError::ParentFull { parent_id } => NetworkError::SlotClaimConflict {
                parent_id,
                slot: u32::MAX,
            },
            StoreError::DuplicateUsername(name) => NetworkError::DuplicateUsername(name),
            StoreError::RootExists => NetworkError::RootAlreadyExists,
            StoreError::NotFound(id) => NetworkError::MemberNotFound(id),
            other => NetworkError::Storage(other.to_string()),
        }
    }
}

impl From<LedgerError> for NetworkError {
    fn from(err: LedgerError) -> Self {
        NetworkError::Storage(err.to_string())
    }
}
