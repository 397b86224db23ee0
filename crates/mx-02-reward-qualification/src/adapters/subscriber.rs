//! Bus handler re-evaluating rewards after investment refreshes
//!
//! Every member named in an `InvestmentTotalsRefreshed` event is evaluated.
//! Evaluation is idempotent, so duplicate or replayed events are harmless.
//! When the subscription falls behind, the dropped events are unknown, so
//! every candidate member is re-evaluated instead.

use crate::ports::inbound::RewardQualificationApi;
use shared_bus::{Delivery, EventFilter, EventTopic, InMemoryEventBus, NetworkEvent, Subscription};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

pub struct RewardEventHandler {
    qualification: Arc<dyn RewardQualificationApi>,
    subscription: Subscription,
}

impl RewardEventHandler {
    /// Subscribe to the investment topic.
    pub fn new(qualification: Arc<dyn RewardQualificationApi>, bus: &InMemoryEventBus) -> Self {
        let subscription = bus.subscribe(EventFilter::topics(vec![EventTopic::Investment]));
        Self {
            qualification,
            subscription,
        }
    }

    /// Evaluate the members an event affects. Returns how many were newly
    /// qualified for at least one reward.
    pub async fn handle_event(&self, event: &NetworkEvent) -> usize {
        let NetworkEvent::InvestmentTotalsRefreshed {
            affected_members, ..
        } = event
        else {
            return 0;
        };

        let mut qualified = 0;
        for member_id in affected_members {
            match self.qualification.evaluate_member(*member_id).await {
                Ok(report) => {
                    if report.newly_qualified().next().is_some() {
                        qualified += 1;
                    }
                }
                Err(err) => warn!(%member_id, error = %err, "Reward evaluation failed"),
            }
        }
        qualified
    }

    /// Re-evaluate every candidate after `skipped` events were lost.
    pub async fn catch_up(&self, skipped: u64) {
        warn!(skipped, "Investment events lost, sweeping all candidates");
        match self.qualification.evaluate_all().await {
            Ok(report) => info!(
                skipped,
                evaluated = report.evaluated,
                qualified = report.qualified,
                "Reward catch-up finished"
            ),
            Err(err) => error!(skipped, error = %err, "Reward catch-up failed"),
        }
    }

    /// Process events until the bus closes.
    #[instrument(skip(self), name = "reward_event_handler")]
    pub async fn run(mut self) {
        info!("Reward event handler started");

        while let Some(delivery) = self.subscription.next_delivery().await {
            match delivery {
                Delivery::Event(event) => {
                    let qualified = self.handle_event(&event).await;
                    debug!(qualified, "Investment refresh handled");
                }
                Delivery::Lagged(skipped) => self.catch_up(skipped).await,
            }
        }

        info!("Event bus closed, reward event handler stopping");
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
