//! Algorithms for reward qualification

pub mod qualification;

pub use qualification::{evaluate_progress, is_eligible, progress_ratio};
