//! Telemetry configuration from environment variables.

use std::env;

use crate::TelemetryError;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Configuration for logging and metrics.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name stamped on the startup record
    pub service_name: String,

    /// Filter directive, e.g. `info` or `mx_01_member_graph=debug,info`
    pub log_level: String,

    /// Write logs to stdout at all
    pub console_output: bool,

    /// One JSON object per line instead of the human format
    pub json_logs: bool,

    /// Also log span close events with their busy/idle timings
    pub span_timings: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "matrix-network".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            span_timings: false,
        }
    }
}

fn env_flag(name: &str) -> Option<bool> {
    env::var(name)
        .ok()
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
}

impl TelemetryConfig {
    /// Read `MX_SERVICE_NAME`, `MX_LOG_LEVEL` (or `RUST_LOG`),
    /// `MX_CONSOLE_OUTPUT`, `MX_JSON_LOGS` and `MX_LOG_SPANS`.
    ///
    /// JSON logs default to on when running under Kubernetes or Docker.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let in_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("MX_SERVICE_NAME").unwrap_or(defaults.service_name),
            log_level: env::var("MX_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or(defaults.log_level),
            console_output: env_flag("MX_CONSOLE_OUTPUT").unwrap_or(defaults.console_output),
            json_logs: env_flag("MX_JSON_LOGS").unwrap_or(in_container),
            span_timings: env_flag("MX_LOG_SPANS").unwrap_or(defaults.span_timings),
        }
    }

    /// Reject a blank service name or a bare level that is not one of the
    /// five `tracing` levels. Directives containing `=` or `,` are left to
    /// the filter parser.
    pub fn validate(&self) -> Result<(), TelemetryError> {
        if self.service_name.trim().is_empty() {
            return Err(TelemetryError::Config("service name is blank".into()));
        }
        let level = self.log_level.trim().to_lowercase();
        let is_directive = level.contains('=') || level.contains(',');
        if !is_directive && !LOG_LEVELS.contains(&level.as_str()) {
            return Err(TelemetryError::Config(format!(
                "unknown log level `{}`",
                self.log_level
            )));
        }
        Ok(())
    }
}
