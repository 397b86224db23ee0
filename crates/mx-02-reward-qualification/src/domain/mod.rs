//! Domain module for reward qualification
//!
//! Contains core entities, errors, and invariants.

pub mod entities;
pub mod errors;
pub mod invariants;

pub use entities::*;
pub use errors::*;
