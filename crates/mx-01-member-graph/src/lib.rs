//! # MX-01: Member Graph Subsystem
//!
//! Places every new member into two overlapping structures: the sponsor
//! graph (who referred whom) and a capacity-bounded placement matrix of
//! width `matrix_width`. Aggregates team metrics over the sponsor graph.
//!
//! ## Architecture
//!
//! - **Domain**: Core entities (Member, DownlineAggregates, StructureReport)
//! - **Algorithms**: Identifier allocation, BFS placement, downline aggregation
//! - **Ports**: Inbound (MemberGraphApi) and Outbound (MemberStore, InvestmentLedger, TimeSource)
//! - **Application**: Signup, refresh and audit orchestration
//! - **Adapters**: In-memory store and ledger, system clock

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use adapters::{InMemoryInvestmentLedger, InMemoryMemberStore, SystemTimeSource};
pub use application::service::MemberGraphService;
pub use config::NetworkConfig;
pub use domain::entities::*;
pub use domain::errors::{LedgerError, NetworkError, StoreError, SIGNUP_FAILURE_MESSAGE};
pub use domain::value_objects::*;
pub use ports::inbound::MemberGraphApi;
pub use ports::outbound::{CodeDirectory, InvestmentLedger, MemberStore, TimeSource};
