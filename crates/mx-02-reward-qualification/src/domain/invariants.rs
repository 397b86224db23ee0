//! Domain invariants for reward qualification

use super::entities::RewardRecord;
use shared_types::RewardStatus;
use std::collections::HashSet;

/// INVARIANT-1: One Record Per Reward Type
/// A member holds at most one record for each reward type.
pub fn invariant_one_record_per_type(records: &[RewardRecord]) -> bool {
    let mut seen = HashSet::new();
    records
        .iter()
        .all(|r| seen.insert((r.member_id, r.reward_type.as_str())))
}

/// INVARIANT-2: Timestamps Follow Status
/// `approved_at` is set exactly when the record reached `approved`, and
/// `processed_at` exactly when it reached `processed`.
pub fn invariant_timestamps_follow_status(record: &RewardRecord) -> bool {
    let approved = matches!(
        record.status,
        RewardStatus::Approved | RewardStatus::Processed
    );
    let processed = record.status == RewardStatus::Processed;

    record.approved_at.is_some() == approved && record.processed_at.is_some() == processed
}

/// INVARIANT-3: Rejections Carry Notes
pub fn invariant_rejection_has_notes(record: &RewardRecord) -> bool {
    record.status != RewardStatus::Rejected
        || record.notes.as_deref().is_some_and(|n| !n.trim().is_empty())
}
