//! # Matrix-Network Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # Placement and aggregation throughput (criterion)
//! └── src/integration/  # Cross-subsystem flows over the shared bus
//!     ├── signup_flow.rs
//!     └── concurrency.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p mx-tests
//! cargo test -p mx-tests integration::concurrency
//! cargo bench -p mx-tests
//! ```

pub mod integration;
