//! # Concurrency Tests
//!
//! Many signups racing for the same placement slots, and duplicate
//! investment refreshes racing to issue the same reward.

#[cfg(test)]
mod tests {
    use super::super::support::{runtime, wait_for_records};
    use mx_01_member_graph::{
        InMemoryInvestmentLedger, InMemoryMemberStore, MemberGraphApi, MemberGraphService,
        MemberStore, NetworkConfig, SignupRequest,
    };
    use mx_02_reward_qualification::{
        DownlineMetricsAdapter, InMemoryRewardRecordStore, QualificationConfig,
        RewardEventHandler, RewardQualificationApi, RewardQualificationService,
        StaticRewardCatalog,
    };
    use shared_bus::InMemoryEventBus;
    use std::sync::Arc;
    use mx_runtime::container::RuntimeConfig;
    use rust_decimal_macros::dec;
    use shared_types::MemberId;
    use std::collections::{HashMap, HashSet};
    use std::time::Duration;

    fn contended_config() -> RuntimeConfig {
        let mut config = RuntimeConfig::default();
        config.network.slot_claim_max_retries = 200;
        config.network.slot_claim_backoff_base_ms = 1;
        config.network.slot_claim_backoff_max_ms = 5;
        config
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_signups_respect_capacity() {
        const SIGNUPS: usize = 120;

        let runtime = runtime(contended_config());
        runtime.start().await.unwrap();
        let c = runtime.container();

        let tasks: Vec<_> = (0..SIGNUPS)
            .map(|i| {
                let graph = c.member_graph.clone();
                tokio::spawn(async move {
                    graph
                        .register_member(SignupRequest {
                            username: format!("member{i}"),
                            sponsor_reference: "root".into(),
                        })
                        .await
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let members = c.member_store.snapshot().await.unwrap();
        assert_eq!(members.len(), SIGNUPS + 1);

        let width = c.config.network.matrix_width;
        let mut children: HashMap<MemberId, Vec<u32>> = HashMap::new();
        for member in &members {
            if let Some(parent) = member.placement_parent_id {
                children.entry(parent).or_default().push(member.placement_slot);
            }
        }
        for slots in children.values() {
            assert!(slots.len() as u32 <= width);
            let unique: HashSet<_> = slots.iter().collect();
            assert_eq!(unique.len(), slots.len());
        }

        let codes: HashSet<&str> = members
            .iter()
            .flat_map(|m| [m.sponsor_code.as_str(), m.trace_code.as_str()])
            .collect();
        assert_eq!(codes.len(), members.len() * 2);

        let report = c.member_graph.audit_structure().await.unwrap();
        assert!(report.is_healthy(), "violations: {:?}", report.violations);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_signups_across_sponsors() {
        let runtime = runtime(contended_config());
        runtime.start().await.unwrap();
        let c = runtime.container();

        let mut sponsors = Vec::new();
        for name in ["north", "south", "east"] {
            let receipt = c
                .member_graph
                .register_member(SignupRequest {
                    username: name.into(),
                    sponsor_reference: "root".into(),
                })
                .await
                .unwrap();
            sponsors.push(receipt.sponsor_code);
        }

        let tasks: Vec<_> = (0..90)
            .map(|i| {
                let graph = c.member_graph.clone();
                let sponsor = sponsors[i % sponsors.len()].clone();
                tokio::spawn(async move {
                    graph
                        .register_member(SignupRequest {
                            username: format!("m{i}"),
                            sponsor_reference: sponsor,
                        })
                        .await
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let report = c.member_graph.audit_structure().await.unwrap();
        assert!(report.is_healthy(), "violations: {:?}", report.violations);
        assert_eq!(report.members_checked, 94);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_duplicate_refreshes_issue_once() {
        let runtime = runtime(RuntimeConfig::default());
        runtime.start().await.unwrap();
        let c = runtime.container();

        let alice = c
            .member_graph
            .register_member(SignupRequest {
                username: "alice".into(),
                sponsor_reference: "root".into(),
            })
            .await
            .unwrap();
        c.ledger.record_investment(alice.member_id, dec!(1500));

        // Bus-driven and direct evaluations race each other
        let tasks: Vec<_> = (0..20)
            .map(|i| {
                let graph = c.member_graph.clone();
                let rewards = c.rewards.clone();
                let member_id = alice.member_id;
                tokio::spawn(async move {
                    if i % 2 == 0 {
                        graph.refresh_investment_totals(member_id).await.map(|_| ()).is_ok()
                    } else {
                        rewards.evaluate_member(member_id).await.is_ok()
                    }
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let records = wait_for_records(c.rewards.as_ref(), alice.member_id, 2).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        let settled = c
            .rewards
            .records_for_member(alice.member_id)
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(settled.len(), 2);
        let types: HashSet<&str> = settled.iter().map(|r| r.reward_type.as_str()).collect();
        assert_eq!(types, HashSet::from(["bronze", "silver"]));

        runtime.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_rewards_survive_a_lagging_handler() {
        let bus = Arc::new(InMemoryEventBus::with_capacity(4));
        let ledger = Arc::new(InMemoryInvestmentLedger::new());
        let graph = Arc::new(
            MemberGraphService::new(
                Arc::new(InMemoryMemberStore::new()),
                ledger.clone(),
                bus.clone(),
                NetworkConfig::default(),
            )
            .unwrap(),
        );
        let graph_api: Arc<dyn MemberGraphApi> = graph.clone();
        let rewards = Arc::new(
            RewardQualificationService::new(
                Arc::new(StaticRewardCatalog::from_json(super::super::support::CATALOG).unwrap()),
                Arc::new(InMemoryRewardRecordStore::new()),
                Arc::new(DownlineMetricsAdapter::new(graph_api)),
                bus.clone(),
                QualificationConfig::default(),
            )
            .unwrap(),
        );
        let handler = RewardEventHandler::new(rewards.clone(), &bus);

        graph.bootstrap_root("admin").await.unwrap();
        let mut members = Vec::new();
        for i in 0..10 {
            let receipt = graph
                .register_member(SignupRequest {
                    username: format!("m{i}"),
                    sponsor_reference: "root".into(),
                })
                .await
                .unwrap();
            ledger.record_investment(receipt.member_id, dec!(600));
            graph
                .refresh_investment_totals(receipt.member_id)
                .await
                .unwrap();
            members.push(receipt.member_id);
        }

        // Far more events than the bus holds were published before this
        let task = handler.spawn();
        for member_id in &members {
            let records = wait_for_records(rewards.as_ref(), *member_id, 1).await;
            assert_eq!(records.len(), 1, "member {member_id} never qualified");
            assert_eq!(records[0].reward_type, "bronze");
        }
        assert!(bus.lagged_events() > 0);
        task.abort();
    }
}
