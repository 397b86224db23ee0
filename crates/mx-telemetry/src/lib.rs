//! # Matrix Telemetry
//!
//! Observability for Matrix-Network subsystems.
//!
//! ## Components
//!
//! - **Logs**: `tracing` events rendered by `tracing-subscriber` (pretty or JSON)
//! - **Metrics**: Prometheus counters and histograms in a process-wide registry
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mx_telemetry::{TelemetryConfig, init_telemetry};
//!
//! fn main() {
//!     let config = TelemetryConfig::from_env();
//!     let _guard = init_telemetry(&config).expect("Failed to init telemetry");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `MX_SERVICE_NAME` | `matrix-network` | Service name in log records |
//! | `MX_LOG_LEVEL` | `info` | Log level filter (falls back to `RUST_LOG`) |
//! | `MX_JSON_LOGS` | `false` | Emit JSON log lines |
//! | `MX_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `MX_LOG_SPANS` | `false` | Log span close events with timings |

mod config;
mod logging;
pub mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{
    encode_metrics, register_metrics, MetricsHandle, AGGREGATIONS_TRUNCATED, MEMBERS_REGISTERED,
    PLACEMENT_FAILURES, PLACEMENT_SEARCH_LEVELS, REWARDS_QUALIFIED, REWARD_TRANSITIONS,
    SLOT_CLAIM_CONFLICTS,
};
pub use tracing_setup::{init_tracing, TracingGuard};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracerInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and metrics.
///
/// Returns a guard that must be held for the lifetime of the application.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    config.validate()?;
    let metrics_handle = register_metrics()?;

    let tracing_guard = init_tracing(config)?;

    Ok(TelemetryGuard {
        _tracing: tracing_guard,
        _metrics: metrics_handle,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    _tracing: TracingGuard,
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}
