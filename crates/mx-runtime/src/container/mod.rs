//! # Subsystem Container
//!
//! Central container holding the subsystem instances with dependency
//! injection of their adapters.

pub mod config;
pub mod subsystems;

pub use config::{ConfigError, RuntimeConfig};
pub use subsystems::SubsystemContainer;
