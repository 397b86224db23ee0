//! Ports module for reward qualification

pub mod inbound;
pub mod outbound;

pub use inbound::RewardQualificationApi;
pub use outbound::{InsertOutcome, MemberMetricsProvider, RewardCatalog, RewardRecordStore};
