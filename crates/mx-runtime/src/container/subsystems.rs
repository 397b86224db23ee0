//! # Subsystem Container
//!
//! Holds both subsystem services and their in-memory adapters.
//!
//! ## Initialization Order
//!
//! ```text
//! Shared:  Event bus
//! Level 1: Member Graph (store, ledger)
//! Level 2: Reward Qualification (catalog, records, metrics from Level 1)
//! ```

use std::sync::Arc;

use tracing::{info, instrument};

use mx_01_member_graph::{
    InMemoryInvestmentLedger, InMemoryMemberStore, MemberGraphApi, MemberGraphService,
};
use mx_02_reward_qualification::{
    DownlineMetricsAdapter, InMemoryRewardRecordStore, RewardQualificationService,
    StaticRewardCatalog,
};
use shared_bus::InMemoryEventBus;

use crate::container::config::{ConfigError, RuntimeConfig};

/// Central container holding all subsystem instances.
pub struct SubsystemContainer {
    // =========================================================================
    // LEVEL 1: Member Graph
    // =========================================================================
    pub member_store: Arc<InMemoryMemberStore>,
    /// Stand-in for the external investment ledger.
    pub ledger: Arc<InMemoryInvestmentLedger>,
    pub member_graph: Arc<MemberGraphService>,

    // =========================================================================
    // LEVEL 2: Reward Qualification
    // =========================================================================
    pub reward_catalog: Arc<StaticRewardCatalog>,
    pub reward_records: Arc<InMemoryRewardRecordStore>,
    pub rewards: Arc<RewardQualificationService>,

    // =========================================================================
    // SHARED INFRASTRUCTURE
    // =========================================================================
    pub event_bus: Arc<InMemoryEventBus>,
    pub config: RuntimeConfig,
}

impl SubsystemContainer {
    /// Validate the configuration and build every subsystem.
    #[instrument(skip_all, name = "container_init")]
    pub fn new(config: RuntimeConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let event_bus = Arc::new(InMemoryEventBus::new());

        let member_store = Arc::new(InMemoryMemberStore::new());
        let ledger = Arc::new(InMemoryInvestmentLedger::new());
        let member_graph = Arc::new(MemberGraphService::new(
            member_store.clone(),
            ledger.clone(),
            event_bus.clone(),
            config.network.clone(),
        )?);
        info!(
            matrix_width = config.network.matrix_width,
            "[mx-01] Member graph initialized"
        );

        let reward_catalog = Arc::new(StaticRewardCatalog::from_definitions(
            config.load_reward_definitions()?,
        )?);
        let reward_records = Arc::new(InMemoryRewardRecordStore::new());
        let graph: Arc<dyn MemberGraphApi> = member_graph.clone();
        let rewards = Arc::new(RewardQualificationService::new(
            reward_catalog.clone(),
            reward_records.clone(),
            Arc::new(DownlineMetricsAdapter::new(graph)),
            event_bus.clone(),
            config.qualification.clone(),
        )?);
        info!(
            definitions = reward_catalog.len(),
            "[mx-02] Reward qualification initialized"
        );

        Ok(Self {
            member_store,
            ledger,
            member_graph,
            reward_catalog,
            reward_records,
            rewards,
            event_bus,
            config,
        })
    }
}
