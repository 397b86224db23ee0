//! Error types for reward qualification

use shared_types::{MemberId, RewardRecordId, RewardStatus};
use thiserror::Error;

/// All errors that can occur in reward qualification
#[derive(Debug, Error)]
pub enum QualificationError {
    /// State machine refused the move
    #[error("Invalid reward transition: {from} -> {to}")]
    InvalidTransition { from: RewardStatus, to: RewardStatus },

    /// Rejection without a reason
    #[error("Notes are required to reject a reward")]
    NotesRequired,

    #[error("Notes exceed {max} characters")]
    NotesTooLong { max: usize },

    #[error("Reward record not found: {0}")]
    RewardNotFound(RewardRecordId),

    #[error("Invalid reward definition {reward_type:?}: {reason}")]
    InvalidDefinition { reward_type: String, reason: String },

    #[error("Member metrics unavailable for {member_id}: {reason}")]
    MetricsUnavailable { member_id: MemberId, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Record store or catalog failure
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Reward record store errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordStoreError {
    #[error("Record not found: {0}")]
    NotFound(RewardRecordId),

    /// Compare-and-set lost to a concurrent update
    #[error("Status changed concurrently, now {actual}")]
    StatusMismatch { actual: RewardStatus },

    #[error("Record store backend failure: {0}")]
    Backend(String),
}

/// Catalog errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Catalog unavailable: {0}")]
    Unavailable(String),
}

impl From<RecordStoreError> for QualificationError {
    fn from(err: RecordStoreError) -> Self {
        match err {
            RecordStoreError::NotFound(id) => QualificationError::RewardNotFound(id),
            other => QualificationError::Storage(other.to_string()),
        }
    }
}

impl From<CatalogError> for QualificationError {
    fn from(err: CatalogError) -> Self {
        QualificationError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = QualificationError::InvalidTransition {
            from: RewardStatus::Qualified,
            to: RewardStatus::Processed,
        };
        assert_eq!(err.to_string(), "Invalid reward transition: qualified -> processed");
    }

    #[test]
    fn test_not_found_conversion() {
        let id = RewardRecordId::new();
        let err: QualificationError = RecordStoreError::NotFound(id).into();
        assert!(matches!(err, QualificationError::RewardNotFound(found) if found == id));
    }
}
