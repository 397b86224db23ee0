//! In-memory reward catalog
//!
//! Definitions are keyed by id. Every edit bumps the definition's version;
//! records keep the version they qualified against.

use crate::domain::entities::RewardDefinition;
use crate::domain::errors::{CatalogError, QualificationError};
use crate::ports::outbound::RewardCatalog;
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::RewardDefinitionId;
use std::collections::BTreeMap;
use tracing::info;

#[derive(Default)]
pub struct StaticRewardCatalog {
    definitions: RwLock<BTreeMap<RewardDefinitionId, RewardDefinition>>,
}

impl StaticRewardCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog, validating each definition.
    pub fn from_definitions(
        definitions: impl IntoIterator<Item = RewardDefinition>,
    ) -> Result<Self, QualificationError> {
        let catalog = Self::new();
        for definition in definitions {
            catalog.insert_new(definition)?;
        }
        Ok(catalog)
    }

    /// Parse a JSON array of definitions.
    pub fn from_json(json: &str) -> Result<Self, QualificationError> {
        let definitions: Vec<RewardDefinition> =
            serde_json::from_str(json).map_err(|e| QualificationError::InvalidDefinition {
                reward_type: "<catalog>".to_string(),
                reason: e.to_string(),
            })?;
        Self::from_definitions(definitions)
    }

    fn insert_new(&self, definition: RewardDefinition) -> Result<(), QualificationError> {
        definition.validate()?;
        let mut definitions = self.definitions.write();
        Self::check_unique(&definitions, &definition)?;
        if definitions.contains_key(&definition.id) {
            return Err(QualificationError::InvalidDefinition {
                reward_type: definition.reward_type,
                reason: "duplicate definition id".to_string(),
            });
        }
        definitions.insert(definition.id, definition);
        Ok(())
    }

    fn check_unique(
        definitions: &BTreeMap<RewardDefinitionId, RewardDefinition>,
        candidate: &RewardDefinition,
    ) -> Result<(), QualificationError> {
        let clash = definitions
            .values()
            .any(|d| d.id != candidate.id && d.reward_type == candidate.reward_type);
        if clash {
            return Err(QualificationError::InvalidDefinition {
                reward_type: candidate.reward_type.clone(),
                reason: "reward type already defined".to_string(),
            });
        }
        Ok(())
    }

    /// Insert or replace a definition. Returns the stored version.
    ///
    /// A replacement gets the previous version plus one. Existing records
    /// are untouched.
    pub fn upsert(&self, mut definition: RewardDefinition) -> Result<u32, QualificationError> {
        definition.validate()?;
        let mut definitions = self.definitions.write();
        Self::check_unique(&definitions, &definition)?;

        definition.version = match definitions.get(&definition.id) {
            Some(previous) => previous.version + 1,
            None => definition.version.max(1),
        };
        let version = definition.version;

        info!(
            definition_id = %definition.id,
            reward_type = %definition.reward_type,
            version,
            "Reward definition saved"
        );
        definitions.insert(definition.id, definition);
        Ok(version)
    }

    /// Stop offering a reward. Already issued records are unaffected.
    pub fn deactivate(&self, id: RewardDefinitionId) -> Result<(), QualificationError> {
        let mut definitions = self.definitions.write();
        let definition = definitions
            .get_mut(&id)
            .ok_or_else(|| QualificationError::InvalidDefinition {
                reward_type: id.to_string(),
                reason: "unknown definition".to_string(),
            })?;
        if definition.active {
            definition.active = false;
            definition.version += 1;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.definitions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.read().is_empty()
    }
}

#[async_trait]
impl RewardCatalog for StaticRewardCatalog {
    async fn active_definitions(&self) -> Result<Vec<RewardDefinition>, CatalogError> {
        Ok(self
            .definitions
            .read()
            .values()
            .filter(|d| d.active)
            .cloned()
            .collect())
    }

    async fn get(&self, id: RewardDefinitionId) -> Result<Option<RewardDefinition>, CatalogError> {
        Ok(self.definitions.read().get(&id).cloned())
    }
}
