//! # Shared Types Crate
//!
//! This crate contains the identifiers, money type and reward status
//! vocabulary shared by every Matrix-Network subsystem.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-subsystem types are defined here.
//! - **Opaque Identifiers**: Members and reward records are addressed by
//!   UUID newtypes; human-readable codes are alternate lookup keys only.
//! - **Fixed-Point Money**: All amounts are `Decimal`, never floating point.

pub mod entities;

pub use entities::*;
