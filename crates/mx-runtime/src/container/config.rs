//! # Runtime Configuration
//!
//! Unified configuration for both subsystems, telemetry and the reward
//! catalog source.

use mx_01_member_graph::NetworkConfig;
use mx_02_reward_qualification::{QualificationConfig, RewardDefinition};
use mx_telemetry::TelemetryConfig;
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// Complete runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub network: NetworkConfig,
    pub qualification: QualificationConfig,
    pub telemetry: TelemetryConfig,
    /// JSON file holding the reward catalog. Empty catalog when unset.
    pub reward_catalog: Option<PathBuf>,
    /// Username given to the root member on first start.
    pub root_username: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            qualification: QualificationConfig::default(),
            telemetry: TelemetryConfig::default(),
            reward_catalog: None,
            root_username: "admin".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid network configuration: {0}")]
    Network(#[from] mx_01_member_graph::NetworkError),

    #[error("Invalid qualification configuration: {0}")]
    Qualification(#[from] mx_02_reward_qualification::QualificationError),

    #[error("Invalid telemetry configuration: {0}")]
    Telemetry(#[from] mx_telemetry::TelemetryError),

    #[error("Failed to read reward catalog {path:?}: {source}")]
    CatalogRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Root username must not be blank")]
    BlankRootUsername,
}

/// Shape of the catalog file.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    rewards: Vec<RewardDefinition>,
}

impl RuntimeConfig {
    /// Load every section from `MX_*` environment variables.
    pub fn from_env() -> Self {
        Self {
            network: NetworkConfig::from_env(),
            qualification: QualificationConfig::from_env(),
            telemetry: TelemetryConfig::from_env(),
            reward_catalog: std::env::var("MX_REWARD_CATALOG").ok().map(PathBuf::from),
            root_username: std::env::var("MX_ROOT_USERNAME")
                .unwrap_or_else(|_| "admin".to_string()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.network.validate()?;
        self.qualification.validate()?;
        self.telemetry.validate()?;
        if self.root_username.trim().is_empty() {
            return Err(ConfigError::BlankRootUsername);
        }
        Ok(())
    }

    /// Read the configured catalog file.
    ///
    /// Accepts either a bare array of definitions or `{"rewards": [...]}`.
    pub fn load_reward_definitions(&self) -> Result<Vec<RewardDefinition>, ConfigError> {
        let Some(path) = &self.reward_catalog else {
            return Ok(Vec::new());
        };

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::CatalogRead {
            path: path.clone(),
            source,
        })?;
        parse_catalog(&raw)
    }
}

fn parse_catalog(raw: &str) -> Result<Vec<RewardDefinition>, ConfigError> {
    let parsed = serde_json::from_str::<Vec<RewardDefinition>>(raw)
        .or_else(|_| serde_json::from_str::<CatalogFile>(raw).map(|f| f.rewards));

    parsed.map_err(|e| {
        ConfigError::Qualification(
            mx_02_reward_qualification::QualificationError::InvalidDefinition {
                reward_type: "<catalog>".to_string(),
                reason: e.to_string(),
            },
        )
    })
}
