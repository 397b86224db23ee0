//! # Signup To Payout Flow
//!
//! Signup → investment → refresh → bus-driven qualification → approval →
//! processing, plus the placement and aggregation reference examples run
//! against the assembled runtime.

#[cfg(test)]
mod tests {
    use super::super::support::{join, runtime, wait_for_records};
    use mx_01_member_graph::{MemberGraphApi, NetworkError, SIGNUP_FAILURE_MESSAGE};
    use mx_02_reward_qualification::RewardQualificationApi;
    use mx_runtime::container::RuntimeConfig;
    use rust_decimal_macros::dec;
    use shared_bus::{EventFilter, EventTopic, NetworkEvent};
    use shared_types::RewardStatus;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_full_reward_lifecycle() {
        let runtime = runtime(RuntimeConfig::default());
        runtime.start().await.unwrap();
        let c = runtime.container();
        let mut reward_events = c
            .event_bus
            .subscribe(EventFilter::topics(vec![EventTopic::Rewards]));

        let alice = join(c.member_graph.as_ref(), "alice", "root").await;
        let bob = join(c.member_graph.as_ref(), "bob", &alice.sponsor_code).await;
        let carol = join(c.member_graph.as_ref(), "carol", "Alice").await;
        assert_eq!(bob.sponsor_id, Some(alice.member_id));
        assert_eq!(carol.sponsor_id, Some(alice.member_id));

        // Bob alone leaves alice short of the bronze direct-business target
        c.ledger.record_investment(bob.member_id, dec!(1200));
        c.member_graph
            .refresh_investment_totals(bob.member_id)
            .await
            .unwrap();
        let bob_records = wait_for_records(c.rewards.as_ref(), bob.member_id, 2).await;
        assert_eq!(bob_records.len(), 2);
        assert!(c
            .rewards
            .records_for_member(alice.member_id)
            .await
            .unwrap()
            .is_empty());

        c.ledger.record_investment(carol.member_id, dec!(900));
        c.member_graph
            .refresh_investment_totals(carol.member_id)
            .await
            .unwrap();

        let alice_records = wait_for_records(c.rewards.as_ref(), alice.member_id, 1).await;
        assert_eq!(alice_records.len(), 1);
        let bronze = &alice_records[0];
        assert_eq!(bronze.reward_type, "bronze");
        assert_eq!(bronze.direct_business_achieved, dec!(2100));
        assert_eq!(bronze.self_invest_achieved, dec!(0));

        let approved = c.rewards.approve(bronze.id, None).await.unwrap();
        assert_eq!(approved.status, RewardStatus::Approved);
        let processed = c
            .rewards
            .process(bronze.id, Some("wire sent".into()))
            .await
            .unwrap();
        assert_eq!(processed.status, RewardStatus::Processed);
        assert!(processed.approved_at.is_some());
        assert!(processed.processed_at.is_some());

        // Re-running evaluation never issues a second bronze
        let report = c.rewards.evaluate_member(alice.member_id).await.unwrap();
        assert_eq!(report.newly_qualified().count(), 0);

        let mut saw_status_change = false;
        while let Ok(Some(event)) =
            timeout(Duration::from_millis(200), reward_events.recv()).await
        {
            if let NetworkEvent::RewardStatusChanged { record_id, to, .. } = event {
                if record_id == bronze.id && to == RewardStatus::Processed {
                    saw_status_change = true;
                }
            }
        }
        assert!(saw_status_change);

        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_placement_spills_under_first_child() {
        let runtime = runtime(RuntimeConfig::default());
        runtime.start().await.unwrap();
        let c = runtime.container();

        let s = join(c.member_graph.as_ref(), "sponsor", "root").await;
        let s1 = join(c.member_graph.as_ref(), "s1", &s.sponsor_code).await;
        let s2 = join(c.member_graph.as_ref(), "s2", &s.sponsor_code).await;
        let s3 = join(c.member_graph.as_ref(), "s3", &s.sponsor_code).await;
        for (i, child) in [&s1, &s2, &s3].into_iter().enumerate() {
            assert_eq!(child.placement_parent_id, Some(s.member_id));
            assert_eq!(child.placement_slot, i as u32);
        }

        let spill = join(c.member_graph.as_ref(), "n", &s.sponsor_code).await;
        assert_eq!(spill.sponsor_id, Some(s.member_id));
        assert_eq!(spill.placement_parent_id, Some(s1.member_id));
        assert_eq!(spill.placement_slot, 0);

        let report = c.member_graph.audit_structure().await.unwrap();
        assert!(report.is_healthy());
        assert_eq!(report.members_checked, 6);
    }

    #[tokio::test]
    async fn test_aggregation_reference_example() {
        let runtime = runtime(RuntimeConfig::default());
        let root_id = runtime.start().await.unwrap();
        let c = runtime.container();

        let a = join(c.member_graph.as_ref(), "a", "root").await;
        let b = join(c.member_graph.as_ref(), "b", "root").await;
        let cc = join(c.member_graph.as_ref(), "c", &a.sponsor_code).await;

        for (member, amount) in [(&a, dec!(100)), (&b, dec!(200)), (&cc, dec!(50))] {
            c.ledger.record_investment(member.member_id, amount);
            c.member_graph
                .refresh_investment_totals(member.member_id)
                .await
                .unwrap();
        }

        let agg = c
            .member_graph
            .compute_downline_aggregates(root_id, None)
            .await
            .unwrap();
        assert_eq!(agg.team_size, 3);
        assert_eq!(agg.team_investment, dec!(350));
        assert_eq!(agg.direct_count, 2);
        assert_eq!(agg.direct_business, dec!(300));
        assert!(agg.is_complete());

        let root = c.member_graph.get_member(root_id).await.unwrap();
        assert_eq!(root.direct_business_total, dec!(300));
    }

    #[tokio::test]
    async fn test_deactivated_sponsor_rejected_generically() {
        let runtime = runtime(RuntimeConfig::default());
        runtime.start().await.unwrap();
        let c = runtime.container();

        let alice = join(c.member_graph.as_ref(), "alice", "root").await;
        c.member_graph
            .deactivate_member(alice.member_id)
            .await
            .unwrap();

        let err = c
            .member_graph
            .register_member(mx_01_member_graph::SignupRequest {
                username: "bob".into(),
                sponsor_reference: alice.sponsor_code.clone(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, NetworkError::InvalidSponsor { .. }));
        assert_eq!(err.user_message(), SIGNUP_FAILURE_MESSAGE);
    }
}
