//! # MX-02: Reward Qualification Subsystem
//!
//! Issues rewards to members whose self investment **or** direct business
//! reaches a catalog target, and moves issued rewards through the admin
//! state machine `qualified -> approved -> processed` (or `rejected`).
//!
//! ## Architecture
//!
//! - **Domain**: RewardDefinition, RewardRecord, state machine rules
//! - **Algorithms**: Progress ratios and OR-semantics eligibility
//! - **Ports**: Inbound (RewardQualificationApi) and Outbound (RewardCatalog, RewardRecordStore, MemberMetricsProvider)
//! - **Application**: Idempotent evaluation and compare-and-set transitions
//! - **Adapters**: Static catalog, in-memory record store, member graph metrics, bus handler

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use adapters::{
    DownlineMetricsAdapter, InMemoryRewardRecordStore, RewardEventHandler, StaticRewardCatalog,
};
pub use application::service::RewardQualificationService;
pub use config::QualificationConfig;
pub use domain::entities::*;
pub use domain::errors::{CatalogError, QualificationError, RecordStoreError};
pub use ports::inbound::RewardQualificationApi;
pub use ports::outbound::{InsertOutcome, MemberMetricsProvider, RewardCatalog, RewardRecordStore};
