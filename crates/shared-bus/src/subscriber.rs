//! # Event Subscriber
//!
//! Receiving side of the bus.

use crate::events::{EventFilter, NetworkEvent};
use crate::publisher::BusStats;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::warn;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    #[error("Event bus closed")]
    Closed,
}

/// What a subscription yields next.
#[derive(Debug, Clone)]
pub enum Delivery {
    Event(NetworkEvent),
    /// The subscriber fell behind and this many events were dropped unseen.
    Lagged(u64),
}

/// Anything that hands out subscriptions.
pub trait EventSubscriber: Send + Sync {
    fn subscribe(&self, filter: EventFilter) -> Subscription;
}

/// Receiver yielding only events that match its filter.
///
/// Dropping the subscription unsubscribes it.
pub struct Subscription {
    receiver: broadcast::Receiver<NetworkEvent>,
    filter: EventFilter,
    stats: Arc<BusStats>,
    missed: u64,
}

impl Subscription {
    pub(crate) fn new(
        receiver: broadcast::Receiver<NetworkEvent>,
        filter: EventFilter,
        stats: Arc<BusStats>,
    ) -> Self {
        Self {
            receiver,
            filter,
            stats,
            missed: 0,
        }
    }

    fn record_lag(&mut self, skipped: u64) {
        self.missed += skipped;
        self.stats.lagged.fetch_add(skipped, Ordering::Relaxed);
        warn!(skipped, total = self.missed, "Subscriber lagged, oldest events skipped");
    }

    /// Next matching event, or `None` once the bus is dropped.
    ///
    /// Lag is counted and skipped over. Consumers that must react to lost
    /// events use [`Subscription::next_delivery`].
    pub async fn recv(&mut self) -> Option<NetworkEvent> {
        loop {
            match self.next_delivery().await? {
                Delivery::Event(event) => return Some(event),
                Delivery::Lagged(_) => {}
            }
        }
    }

    /// Next matching event or a lag notice, or `None` once the bus is dropped.
    ///
    /// Skipped events may have matched the filter or not; the count covers
    /// every event dropped for this subscriber.
    pub async fn next_delivery(&mut self) -> Option<Delivery> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.filter.matches(&event) => return Some(Delivery::Event(event)),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    self.record_lag(skipped);
                    return Some(Delivery::Lagged(skipped));
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Next matching event if one is already buffered.
    pub fn try_recv(&mut self) -> Result<Option<NetworkEvent>, SubscriptionError> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.filter.matches(&event) => return Ok(Some(event)),
                Ok(_) => {}
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => self.record_lag(skipped),
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(SubscriptionError::Closed)
                }
            }
        }
    }

    /// Events this subscriber skipped by falling behind.
    #[must_use]
    pub fn missed(&self) -> u64 {
        self.missed
    }

    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }
}
