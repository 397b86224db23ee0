//! # Matrix-Network Runtime Binary
//!
//! Loads configuration from the environment, initializes telemetry and runs
//! until Ctrl+C.

use anyhow::{Context, Result};
use tracing::info;

use mx_runtime::container::RuntimeConfig;
use mx_runtime::NetworkRuntime;

#[tokio::main]
async fn main() -> Result<()> {
    let config = RuntimeConfig::from_env();

    let _telemetry =
        mx_telemetry::init_telemetry(&config.telemetry).context("Failed to initialize telemetry")?;

    let runtime = NetworkRuntime::new(config)?;
    runtime.start().await?;

    info!("Network is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    runtime.shutdown().await;

    Ok(())
}
