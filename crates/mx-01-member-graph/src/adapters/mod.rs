//! Adapters implementing the outbound ports

pub mod clock;
pub mod ledger;
pub mod memory_store;

pub use clock::SystemTimeSource;
pub use ledger::InMemoryInvestmentLedger;
pub use memory_store::InMemoryMemberStore;
