//! # Shared Bus - Event Bus for Inter-Subsystem Communication
//!
//! Subsystems never call each other directly for reactions; they publish
//! `NetworkEvent`s and interested subsystems subscribe.
//!
//! ## Choreography Pattern
//!
//! ```text
//! ┌──────────────────┐                    ┌──────────────────────┐
//! │ Member Graph (1) │                    │ Reward Qualification │
//! │                  │    publish()       │         (2)          │
//! │                  │ ──────┐            │                      │
//! └──────────────────┘       │            └──────────────────────┘
//!                            ▼                    ↑
//!                      ┌──────────────┐          │
//!                      │  Event Bus   │          │
//!                      │              │ ─────────┘
//!                      └──────────────┘  subscribe()
//! ```

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{EventFilter, EventTopic, NetworkEvent};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{Delivery, EventSubscriber, Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// Subsystem identifiers used as event sources.
pub mod subsystem_ids {
    /// Runtime / wiring layer.
    pub const RUNTIME: u8 = 0;
    /// Member graph: signup, placement, aggregation.
    pub const MEMBER_GRAPH: u8 = 1;
    /// Reward qualification engine.
    pub const REWARD_QUALIFICATION: u8 = 2;
}
