//! Subscriber setup for structured logs.
//!
//! Installs a global `tracing` subscriber with an `EnvFilter` and either a
//! pretty or a JSON formatting layer.

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{TelemetryConfig, TelemetryError};

/// Guard returned once the global subscriber is installed.
pub struct TracingGuard {
    service: String,
}

impl Drop for TracingGuard {
    fn drop(&mut self) {
        tracing::debug!(service = %self.service, "Tracing guard dropped");
    }
}

fn span_events(config: &TelemetryConfig) -> FmtSpan {
    if config.span_timings {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    }
}

/// Install the global subscriber.
///
/// Fails if the configuration is invalid or a global subscriber was
/// already set.
pub fn init_tracing(config: &TelemetryConfig) -> Result<TracingGuard, TelemetryError> {
    config.validate()?;
    let env_filter =
        EnvFilter::try_new(&config.log_level).map_err(|e| TelemetryError::Config(e.to_string()))?;
    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if !config.console_output {
        registry.try_init()
    } else if config.json_logs {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_events(span_events(config))
                    .with_thread_ids(true),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_span_events(span_events(config))
                    .with_ansi(true),
            )
            .try_init()
    };
    installed.map_err(|e| TelemetryError::TracerInit(e.to_string()))?;

    tracing::info!(
        service = %config.service_name,
        json = config.json_logs,
        level = %config.log_level,
        "Tracing initialized"
    );

    Ok(TracingGuard {
        service: config.service_name.clone(),
    })
}
