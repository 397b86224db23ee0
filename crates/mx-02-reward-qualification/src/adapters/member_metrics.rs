//! Member metrics read from the member graph

use crate::domain::entities::MemberMetrics;
use crate::domain::errors::QualificationError;
use crate::ports::outbound::MemberMetricsProvider;
use async_trait::async_trait;
use mx_01_member_graph::{MemberGraphApi, NetworkError};
use shared_types::MemberId;
use std::sync::Arc;

/// Reads self investment from the member and direct business from a
/// one-level downline walk. A walk cut short by the node bound is reported
/// as `MetricsUnavailable`, never evaluated as a partial sum.
pub struct DownlineMetricsAdapter {
    graph: Arc<dyn MemberGraphApi>,
}

impl DownlineMetricsAdapter {
    pub fn new(graph: Arc<dyn MemberGraphApi>) -> Self {
        Self { graph }
    }
}

fn unavailable(member_id: MemberId) -> impl Fn(NetworkError) -> QualificationError {
    move |err| QualificationError::MetricsUnavailable {
        member_id,
        reason: err.to_string(),
    }
}

#[async_trait]
impl MemberMetricsProvider for DownlineMetricsAdapter {
    async fn metrics(&self, member_id: MemberId) -> Result<MemberMetrics, QualificationError> {
        let member = self
            .graph
            .get_member(member_id)
            .await
            .map_err(unavailable(member_id))?;
        let direct = self
            .graph
            .compute_downline_aggregates(member_id, Some(1))
            .await
            .and_then(|aggregates| aggregates.require_complete())
            .map_err(unavailable(member_id))?;

        Ok(MemberMetrics {
            member_id,
            active: member.active,
            self_investment: member.self_investment_total,
            direct_business: direct.direct_business,
        })
    }

    async fn candidates(&self) -> Result<Vec<MemberId>, QualificationError> {
        self.graph
            .invested_members()
            .await
            .map_err(|err| QualificationError::Storage(err.to_string()))
    }
}
