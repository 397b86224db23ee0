//! # Integration Tests
//!
//! Both subsystems wired through the runtime container, exercised the way
//! the signup service, investment ledger feed and administrators use them.

pub mod concurrency;
pub mod signup_flow;

#[cfg(test)]
pub(crate) mod support {
    use mx_01_member_graph::{MemberGraphApi, SignupReceipt, SignupRequest};
    use mx_02_reward_qualification::{RewardQualificationApi, RewardRecord};
    use mx_runtime::container::RuntimeConfig;
    use mx_runtime::NetworkRuntime;
    use shared_types::MemberId;
    use std::time::Duration;

    pub const CATALOG: &str = r#"{"rewards": [
        {"id": 1, "reward_type": "bronze", "name": "Bronze",
         "self_invest_target": "500", "direct_business_target": "2000", "reward_value": "25"},
        {"id": 2, "reward_type": "silver", "name": "Silver",
         "self_invest_target": "1000", "direct_business_target": "5000", "reward_value": "100"}
    ]}"#;

    /// Runtime loading `CATALOG` from a file, the way the binary does.
    pub fn runtime(mut config: RuntimeConfig) -> NetworkRuntime {
        let path = std::env::temp_dir().join(format!("mx-catalog-{}.json", MemberId::new()));
        std::fs::write(&path, CATALOG).unwrap();
        config.reward_catalog = Some(path.clone());

        let runtime = NetworkRuntime::new(config).unwrap();
        std::fs::remove_file(path).ok();
        runtime
    }

    pub async fn join(
        graph: &dyn MemberGraphApi,
        username: &str,
        sponsor: &str,
    ) -> SignupReceipt {
        graph
            .register_member(SignupRequest {
                username: username.to_string(),
                sponsor_reference: sponsor.to_string(),
            })
            .await
            .unwrap()
    }

    /// Poll until the bus-driven evaluation has issued `expected` records.
    pub async fn wait_for_records(
        rewards: &dyn RewardQualificationApi,
        member_id: MemberId,
        expected: usize,
    ) -> Vec<RewardRecord> {
        let mut records = Vec::new();
        for _ in 0..200 {
            records = rewards.records_for_member(member_id).await.unwrap();
            if records.len() >= expected {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        records
    }
}
