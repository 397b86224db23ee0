//! Adapters for reward qualification

pub mod catalog;
pub mod member_metrics;
pub mod record_store;
pub mod subscriber;

pub use catalog::StaticRewardCatalog;
pub use member_metrics::DownlineMetricsAdapter;
pub use record_store::InMemoryRewardRecordStore;
pub use subscriber::RewardEventHandler;
