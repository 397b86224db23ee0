//! # Event Publisher
//!
//! Publishing side of the bus plus delivery statistics.

use crate::events::{EventFilter, EventTopic, NetworkEvent};
use crate::subscriber::{EventSubscriber, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Trait for publishing events to the bus.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an event. Returns the number of subscribers it reached.
    async fn publish(&self, event: NetworkEvent) -> usize;

    /// Total events published, delivered or not.
    fn events_published(&self) -> u64;
}

/// Counters shared between the bus and its subscriptions.
#[derive(Debug, Default)]
pub(crate) struct BusStats {
    published: AtomicU64,
    undelivered: AtomicU64,
    pub(crate) lagged: AtomicU64,
    per_topic: Mutex<HashMap<EventTopic, u64>>,
}

/// In-process event bus over `tokio::sync::broadcast`.
///
/// Every subscriber sees every event; filtering happens on receive. A
/// subscriber more than `capacity` events behind skips the oldest ones.
pub struct InMemoryEventBus {
    sender: broadcast::Sender<NetworkEvent>,
    stats: Arc<BusStats>,
    capacity: usize,
}

impl InMemoryEventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            stats: Arc::new(BusStats::default()),
            capacity,
        }
    }

    /// Subscribe to events matching a filter.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        debug!(topics = ?filter.topics, "New subscription created");
        Subscription::new(self.sender.subscribe(), filter, self.stats.clone())
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Events published on one topic.
    #[must_use]
    pub fn published_on(&self, topic: EventTopic) -> u64 {
        self.stats
            .per_topic
            .lock()
            .get(&topic)
            .copied()
            .unwrap_or(0)
    }

    /// Events published while nobody was subscribed.
    #[must_use]
    pub fn undelivered(&self) -> u64 {
        self.stats.undelivered.load(Ordering::Relaxed)
    }

    /// Events skipped by lagging subscribers, summed over all of them.
    #[must_use]
    pub fn lagged_events(&self) -> u64 {
        self.stats.lagged.load(Ordering::Relaxed)
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSubscriber for InMemoryEventBus {
    fn subscribe(&self, filter: EventFilter) -> Subscription {
        InMemoryEventBus::subscribe(self, filter)
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: NetworkEvent) -> usize {
        let topic = event.topic();
        let source = event.source_subsystem();

        self.stats.published.fetch_add(1, Ordering::Relaxed);
        *self.stats.per_topic.lock().entry(topic).or_insert(0) += 1;

        match self.sender.send(event) {
            Ok(receivers) => {
                trace!(?topic, source, receivers, "Event published");
                receivers
            }
            Err(_) => {
                self.stats.undelivered.fetch_add(1, Ordering::Relaxed);
                debug!(?topic, source, "Event published with no subscribers");
                0
            }
        }
    }

    fn events_published(&self) -> u64 {
        self.stats.published.load(Ordering::Relaxed)
    }
}
