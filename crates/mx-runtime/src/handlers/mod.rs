//! # Event Handlers
//!
//! Long-running bus consumers owned by the runtime. Reward re-evaluation
//! lives with its subsystem as `RewardEventHandler`.

pub mod critical;

pub use critical::CriticalEventMonitor;
