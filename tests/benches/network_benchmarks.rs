//! # Matrix-Network Benchmarks
//!
//! | Path | Operation |
//! |------|-----------|
//! | mx-01 | Signup with BFS placement into a filling matrix |
//! | mx-01 | Unbounded downline aggregation |
//! | mx-02 | Evaluation of an already-qualified member |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use mx_01_member_graph::{
    InMemoryInvestmentLedger, InMemoryMemberStore, MemberGraphApi, MemberGraphService,
    NetworkConfig, SignupRequest,
};
use mx_02_reward_qualification::{
    DownlineMetricsAdapter, InMemoryRewardRecordStore, QualificationConfig,
    RewardQualificationApi, RewardQualificationService, StaticRewardCatalog,
};
use rust_decimal_macros::dec;
use shared_bus::InMemoryEventBus;
use shared_types::MemberId;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

fn graph(ledger: Arc<InMemoryInvestmentLedger>) -> Arc<MemberGraphService> {
    let config = NetworkConfig {
        code_seed: Some(7),
        ..NetworkConfig::default()
    };
    Arc::new(
        MemberGraphService::new(
            Arc::new(InMemoryMemberStore::new()),
            ledger,
            Arc::new(InMemoryEventBus::new()),
            config,
        )
        .expect("valid config"),
    )
}

/// Root plus `size` members, each sponsored by the root.
async fn populated(
    size: usize,
) -> (
    Arc<MemberGraphService>,
    Arc<InMemoryInvestmentLedger>,
    MemberId,
) {
    let ledger = Arc::new(InMemoryInvestmentLedger::new());
    let graph = graph(ledger.clone());
    let root = graph.bootstrap_root("admin").await.expect("root");
    for i in 0..size {
        let receipt = graph
            .register_member(SignupRequest {
                username: format!("m{i}"),
                sponsor_reference: "root".into(),
            })
            .await
            .expect("signup");
        ledger.record_investment(receipt.member_id, dec!(10));
        graph
            .refresh_investment_totals(receipt.member_id)
            .await
            .expect("refresh");
    }
    (graph, ledger, root.member_id)
}

fn bench_signup_placement(c: &mut Criterion) {
    let rt = Runtime::new().expect("tokio runtime");
    let mut group = c.benchmark_group("mx-01-signup");
    group.measurement_time(Duration::from_secs(10));

    for size in [100usize, 1_000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("fill_matrix", size), &size, |b, &size| {
            b.iter(|| rt.block_on(async { black_box(populated(size).await) }))
        });
    }
    group.finish();
}

fn bench_downline_aggregation(c: &mut Criterion) {
    let rt = Runtime::new().expect("tokio runtime");
    let mut group = c.benchmark_group("mx-01-aggregation");

    for size in [1_000usize, 5_000] {
        let (graph, _ledger, root) = rt.block_on(populated(size));
        group.bench_with_input(BenchmarkId::new("unbounded", size), &size, |b, _| {
            b.iter(|| {
                rt.block_on(async {
                    black_box(
                        graph
                            .compute_downline_aggregates(root, None)
                            .await
                            .expect("aggregate"),
                    )
                })
            })
        });
    }
    group.finish();
}

fn bench_reward_evaluation(c: &mut Criterion) {
    let rt = Runtime::new().expect("tokio runtime");
    let (graph, _ledger, root) = rt.block_on(populated(200));

    let catalog = StaticRewardCatalog::from_json(
        r#"[{"id": 1, "reward_type": "bronze", "name": "Bronze",
             "self_invest_target": "500", "direct_business_target": "1000",
             "reward_value": "25"}]"#,
    )
    .expect("catalog");
    let graph_api: Arc<dyn MemberGraphApi> = graph;
    let rewards = RewardQualificationService::new(
        Arc::new(catalog),
        Arc::new(InMemoryRewardRecordStore::new()),
        Arc::new(DownlineMetricsAdapter::new(graph_api)),
        Arc::new(InMemoryEventBus::new()),
        QualificationConfig::default(),
    )
    .expect("service");

    c.bench_function("mx-02-evaluate-held", |b| {
        b.iter(|| {
            rt.block_on(async {
                black_box(rewards.evaluate_member(root).await.expect("evaluate"))
            })
        })
    });
}

criterion_group!(
    benches,
    bench_signup_placement,
    bench_downline_aggregation,
    bench_reward_evaluation
);
criterion_main!(benches);
