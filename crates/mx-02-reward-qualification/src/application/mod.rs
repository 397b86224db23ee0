//! Application layer for reward qualification

pub mod service;

pub use service::RewardQualificationService;
