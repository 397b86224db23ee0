//! Application layer for the member graph

pub mod service;

pub use service::MemberGraphService;
