//! Ports module for the member graph
//!
//! Defines inbound (API) and outbound (SPI) port traits.

pub mod inbound;
pub mod outbound;

pub use inbound::MemberGraphApi;
pub use outbound::{CodeDirectory, InvestmentLedger, MemberStore, TimeSource};
