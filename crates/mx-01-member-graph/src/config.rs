//! Configuration for the member graph subsystem

use crate::domain::errors::NetworkError;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Member graph configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Direct placement children per node
    pub matrix_width: u32,
    pub sponsor_code_prefix: String,
    pub trace_code_prefix: String,
    /// Draws per code before `AllocationExhausted`
    pub max_code_attempts: u32,
    /// Fixed RNG seed for reproducible code sequences
    pub code_seed: Option<u64>,
    /// Retries after a lost slot claim before `PlacementFailed`
    pub slot_claim_max_retries: u32,
    pub slot_claim_backoff_base_ms: u64,
    pub slot_claim_backoff_max_ms: u64,
    /// Placement search depth below the sponsor
    pub max_placement_levels: u32,
    /// Depth guard for unbounded downline walks
    pub max_traversal_depth: u32,
    /// Members counted before a downline walk stops
    pub max_aggregation_nodes: u64,
    /// Place signups without a sponsor reference under the root
    pub fallback_to_root: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            matrix_width: 3,
            sponsor_code_prefix: "HS".to_string(),
            trace_code_prefix: "TR".to_string(),
            max_code_attempts: 20,
            code_seed: None,
            slot_claim_max_retries: 5,
            slot_claim_backoff_base_ms: 10,
            slot_claim_backoff_max_ms: 200,
            max_placement_levels: 64,
            max_traversal_depth: 1024,
            max_aggregation_nodes: 1_000_000,
            fallback_to_root: false,
        }
    }
}

impl NetworkConfig {
    /// Defaults overridden by `MX_*` environment variables.
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            matrix_width: env_or("MX_MATRIX_WIDTH", d.matrix_width),
            sponsor_code_prefix: env::var("MX_SPONSOR_CODE_PREFIX")
                .unwrap_or(d.sponsor_code_prefix),
            trace_code_prefix: env::var("MX_TRACE_CODE_PREFIX").unwrap_or(d.trace_code_prefix),
            max_code_attempts: env_or("MX_MAX_CODE_ATTEMPTS", d.max_code_attempts),
            code_seed: env::var("MX_CODE_SEED").ok().and_then(|v| v.parse().ok()),
            slot_claim_max_retries: env_or("MX_SLOT_CLAIM_MAX_RETRIES", d.slot_claim_max_retries),
            slot_claim_backoff_base_ms: env_or(
                "MX_SLOT_CLAIM_BACKOFF_BASE_MS",
                d.slot_claim_backoff_base_ms,
            ),
            slot_claim_backoff_max_ms: env_or(
                "MX_SLOT_CLAIM_BACKOFF_MAX_MS",
                d.slot_claim_backoff_max_ms,
            ),
            max_placement_levels: env_or("MX_MAX_PLACEMENT_LEVELS", d.max_placement_levels),
            max_traversal_depth: env_or("MX_MAX_TRAVERSAL_DEPTH", d.max_traversal_depth),
            max_aggregation_nodes: env_or("MX_MAX_AGGREGATION_NODES", d.max_aggregation_nodes),
            fallback_to_root: env::var("MX_FALLBACK_TO_ROOT")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(d.fallback_to_root),
        }
    }

    pub fn validate(&self) -> Result<(), NetworkError> {
        let invalid = |msg: &str| Err(NetworkError::InvalidConfiguration(msg.to_string()));

        if self.matrix_width == 0 {
            return invalid("matrix_width must be at least 1");
        }
        for prefix in [&self.sponsor_code_prefix, &self.trace_code_prefix] {
            if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_uppercase()) {
                return invalid("code prefixes must be non-empty uppercase ASCII");
            }
        }
        if self.sponsor_code_prefix == self.trace_code_prefix {
            return invalid("sponsor and trace code prefixes must differ");
        }
        if self.max_code_attempts == 0 {
            return invalid("max_code_attempts must be at least 1");
        }
        if self.slot_claim_backoff_base_ms > self.slot_claim_backoff_max_ms {
            return invalid("slot claim backoff base exceeds its maximum");
        }
        if self.max_traversal_depth == 0 || self.max_aggregation_nodes == 0 {
            return invalid("traversal bounds must be positive");
        }
        Ok(())
    }

    /// Backoff before retry number `attempt` (1-based), doubling and capped.
    pub fn slot_claim_backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        let ms = self
            .slot_claim_backoff_base_ms
            .saturating_mul(factor)
            .min(self.slot_claim_backoff_max_ms);
        Duration::from_millis(ms)
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NetworkConfig::default();
        assert_eq!(config.matrix_width, 3);
        assert_eq!(config.sponsor_code_prefix, "HS");
        assert_eq!(config.max_code_attempts, 20);
        assert!(!config.fallback_to_root);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_failures() {
        let zero_width = NetworkConfig {
            matrix_width: 0,
            ..NetworkConfig::default()
        };
        assert!(matches!(
            zero_width.validate(),
            Err(NetworkError::InvalidConfiguration(_))
        ));

        let same_prefix = NetworkConfig {
            trace_code_prefix: "HS".into(),
            ..NetworkConfig::default()
        };
        assert!(same_prefix.validate().is_err());

        let backwards_backoff = NetworkConfig {
            slot_claim_backoff_base_ms: 500,
            ..NetworkConfig::default()
        };
        assert!(backwards_backoff.validate().is_err());
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let config = NetworkConfig::default();
        assert_eq!(config.slot_claim_backoff(1), Duration::from_millis(10));
        assert_eq!(config.slot_claim_backoff(2), Duration::from_millis(20));
        assert_eq!(config.slot_claim_backoff(4), Duration::from_millis(80));
        assert_eq!(config.slot_claim_backoff(10), Duration::from_millis(200));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: NetworkConfig =
            serde_json::from_str(r#"{"matrix_width": 5, "fallback_to_root": true}"#).unwrap();
        assert_eq!(config.matrix_width, 5);
        assert!(config.fallback_to_root);
        assert_eq!(config.trace_code_prefix, "TR");
    }
}
