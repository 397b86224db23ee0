//! # Matrix-Network Runtime
//!
//! Runs the member graph and reward qualification subsystems in one
//! process, connected by the shared event bus.
//!
//! ## Choreography
//!
//! ```text
//! MemberGraph(1) ──InvestmentTotalsRefreshed──→ Event Bus
//!                                                   │
//!                                                   ↓
//!                                    RewardEventHandler (mx-02)
//!                                                   │
//!                                                   ↓
//!                                   RewardQualified ──→ Event Bus
//! ```
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (environment, optional catalog file)
//! 2. Initialize telemetry
//! 3. Build subsystems in dependency order
//! 4. Create the root member (if not exists)
//! 5. Start event handlers

pub mod container;
pub mod handlers;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info};

use mx_01_member_graph::{MemberGraphApi, MemberStore};
use mx_02_reward_qualification::RewardEventHandler;
use shared_types::MemberId;

use crate::container::{RuntimeConfig, SubsystemContainer};
use crate::handlers::CriticalEventMonitor;

/// The runtime orchestrating both subsystems.
pub struct NetworkRuntime {
    container: Arc<SubsystemContainer>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl NetworkRuntime {
    /// Build every subsystem from configuration.
    pub fn new(config: RuntimeConfig) -> Result<Self> {
        info!("Creating Matrix-Network runtime");

        let container =
            Arc::new(SubsystemContainer::new(config).context("Failed to build subsystems")?);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            container,
            shutdown_tx,
            shutdown_rx,
            tasks: Mutex::new(Vec::new()),
        })
    }

    /// Start the runtime.
    ///
    /// Creates the root member on an empty network, then starts the event
    /// handlers. Returns the root member's id.
    pub async fn start(&self) -> Result<MemberId> {
        info!("===========================================");
        info!("  Matrix-Network Runtime v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");

        let root_id = self.initialize_root().await?;
        self.start_handlers().await;

        info!(
            %root_id,
            matrix_width = self.container.config.network.matrix_width,
            rewards = self.container.reward_catalog.len(),
            "All subsystems initialized and running"
        );
        Ok(root_id)
    }

    /// Create the root member if the store is empty.
    async fn initialize_root(&self) -> Result<MemberId> {
        let existing = self
            .container
            .member_store
            .root()
            .await
            .context("Failed to read root member")?;

        if let Some(root) = existing {
            info!(member_id = %root.id, "Root member found");
            return Ok(root.id);
        }

        let receipt = self
            .container
            .member_graph
            .bootstrap_root(&self.container.config.root_username)
            .await
            .context("Failed to create root member")?;
        info!(
            member_id = %receipt.member_id,
            sponsor_code = %receipt.sponsor_code,
            "Root member created"
        );
        Ok(receipt.member_id)
    }

    async fn start_handlers(&self) {
        let bus = &self.container.event_bus;

        let rewards = RewardEventHandler::new(self.container.rewards.clone(), bus);
        let mut rewards_shutdown = self.shutdown_rx.clone();
        let rewards_task = tokio::spawn(async move {
            tokio::select! {
                _ = rewards.run() => {}
                _ = rewards_shutdown.changed() => {
                    info!("[mx-02] Shutdown signal received");
                }
            }
        });

        let monitor = CriticalEventMonitor::new(bus);
        let mut monitor_shutdown = self.shutdown_rx.clone();
        let monitor_task = tokio::spawn(async move {
            tokio::select! {
                _ = monitor.run() => {}
                _ = monitor_shutdown.changed() => {
                    info!("[runtime] Critical monitor shutdown");
                }
            }
        });

        self.tasks.lock().await.extend([rewards_task, monitor_task]);
        info!("Event handlers started");
    }

    /// Signal handlers to stop and wait for them.
    pub async fn shutdown(&self) {
        info!("Initiating graceful shutdown...");

        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }

        for task in self.tasks.lock().await.drain(..) {
            if let Err(e) = task.await {
                error!("Handler task failed: {}", e);
            }
        }

        match mx_telemetry::encode_metrics() {
            Ok(text) => info!(bytes = text.len(), "Final metrics snapshot encoded"),
            Err(e) => error!("Failed to encode metrics: {}", e),
        }
        info!("Shutdown complete");
    }

    /// Get a reference to the subsystem container.
    pub fn container(&self) -> Arc<SubsystemContainer> {
        Arc::clone(&self.container)
    }
}
