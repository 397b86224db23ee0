//! Configuration for reward qualification

use crate::domain::errors::QualificationError;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualificationConfig {
    /// Issue rewards to deactivated members
    pub evaluate_inactive_members: bool,
    /// Longest admin note accepted on a transition
    pub max_notes_len: usize,
}

impl Default for QualificationConfig {
    fn default() -> Self {
        Self {
            evaluate_inactive_members: false,
            max_notes_len: 1000,
        }
    }
}

impl QualificationConfig {
    /// Defaults overridden by `MX_*` environment variables.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            evaluate_inactive_members: env::var("MX_EVALUATE_INACTIVE_MEMBERS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(d.evaluate_inactive_members),
            max_notes_len: env::var("MX_MAX_NOTES_LEN")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(d.max_notes_len),
        }
    }

    pub fn validate(&self) -> Result<(), QualificationError> {
        if self.max_notes_len == 0 {
            return Err(QualificationError::InvalidConfiguration(
                "max_notes_len must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
