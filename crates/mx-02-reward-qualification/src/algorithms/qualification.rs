//! Qualification rules
//!
//! A member qualifies for a reward when **either** threshold is met:
//! self investment reaches its target, or direct business reaches its
//! target. Progress ratios are `min(achieved / target, 1)`.

use crate::domain::entities::{MemberMetrics, RewardDefinition, RewardProgress};
use shared_types::{Amount, Decimal, RewardStatus};

/// `achieved / target` clamped to `[0, 1]`.
///
/// A non-positive target counts as already met.
pub fn progress_ratio(achieved: Amount, target: Amount) -> Decimal {
    if target <= Amount::ZERO {
        return Decimal::ONE;
    }
    achieved
        .checked_div(target)
        .unwrap_or(Decimal::ONE)
        .clamp(Decimal::ZERO, Decimal::ONE)
}

/// OR-semantics eligibility check.
pub fn is_eligible(definition: &RewardDefinition, metrics: &MemberMetrics) -> bool {
    metrics.self_investment >= definition.self_invest_target
        || metrics.direct_business >= definition.direct_business_target
}

/// Progress of one member toward one reward.
pub fn evaluate_progress(
    definition: &RewardDefinition,
    metrics: &MemberMetrics,
    status: Option<RewardStatus>,
) -> RewardProgress {
    RewardProgress {
        definition_id: definition.id,
        reward_type: definition.reward_type.clone(),
        self_invest_progress: progress_ratio(
            metrics.self_investment,
            definition.self_invest_target,
        ),
        direct_business_progress: progress_ratio(
            metrics.direct_business,
            definition.direct_business_target,
        ),
        eligible: is_eligible(definition, metrics),
        status,
    }
}
