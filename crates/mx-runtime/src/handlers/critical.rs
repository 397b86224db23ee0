//! # Critical Event Monitor
//!
//! Surfaces `CriticalError` events from any subsystem in the operator log.

use shared_bus::{EventFilter, EventTopic, InMemoryEventBus, NetworkEvent, Subscription};
use tracing::{error, info, instrument};

pub struct CriticalEventMonitor {
    subscription: Subscription,
}

impl CriticalEventMonitor {
    pub fn new(bus: &InMemoryEventBus) -> Self {
        Self {
            subscription: bus.subscribe(EventFilter::topics(vec![EventTopic::Critical])),
        }
    }

    /// Log critical events until the bus closes. Returns how many were seen.
    #[instrument(skip(self), name = "critical_event_monitor")]
    pub async fn run(mut self) -> u64 {
        let mut seen = 0;
        while let Some(event) = self.subscription.recv().await {
            if let NetworkEvent::CriticalError {
                subsystem_id,
                error,
            } = event
            {
                seen += 1;
                error!(subsystem_id, %error, "Critical subsystem error");
            }
        }
        info!(seen, "Critical event monitor stopped");
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_bus::EventPublisher;
    use shared_types::MemberId;

    #[tokio::test]
    async fn test_counts_critical_events_until_bus_closes() {
        let bus = InMemoryEventBus::new();
        let monitor = CriticalEventMonitor::new(&bus);

        bus.publish(NetworkEvent::CriticalError {
            subsystem_id: 1,
            error: "member store unavailable".into(),
        })
        .await;
        // Filtered out by topic
        bus.publish(NetworkEvent::MemberDeactivated {
            member_id: MemberId::new(),
        })
        .await;
        drop(bus);

        assert_eq!(monitor.run().await, 1);
    }
}
