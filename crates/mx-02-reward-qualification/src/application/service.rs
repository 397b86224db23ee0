//! Reward Qualification Service
//!
//! Main service implementing RewardQualificationApi.

use crate::algorithms::evaluate_progress;
use crate::config::QualificationConfig;
use crate::domain::entities::{
    EvaluationReport, QualificationOutcome, RewardProgress, RewardRecord, SweepReport,
};
use crate::domain::errors::{QualificationError, RecordStoreError};
use crate::ports::inbound::RewardQualificationApi;
use crate::ports::outbound::{InsertOutcome, MemberMetricsProvider, RewardCatalog, RewardRecordStore};
use async_trait::async_trait;
use mx_01_member_graph::{SystemTimeSource, TimeSource};
use mx_telemetry::metrics::SUBSYSTEM_ERRORS;
use mx_telemetry::{REWARDS_QUALIFIED, REWARD_TRANSITIONS};
use shared_bus::{subsystem_ids, EventPublisher, NetworkEvent};
use shared_types::{MemberId, RewardRecordId, RewardStatus};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

const SUBSYSTEM: &str = "reward-qualification";

/// Reward Qualification Service
///
/// Evaluation reads member metrics once, then checks every active
/// definition. Records are created with insert-if-absent so concurrent
/// evaluations of the same member issue each reward at most once.
/// Admin transitions compare-and-set on the status they started from.
pub struct RewardQualificationService {
    catalog: Arc<dyn RewardCatalog>,
    records: Arc<dyn RewardRecordStore>,
    metrics: Arc<dyn MemberMetricsProvider>,
    events: Arc<dyn EventPublisher>,
    clock: Arc<dyn TimeSource>,
    config: QualificationConfig,
}

impl RewardQualificationService {
    pub fn new(
        catalog: Arc<dyn RewardCatalog>,
        records: Arc<dyn RewardRecordStore>,
        metrics: Arc<dyn MemberMetricsProvider>,
        events: Arc<dyn EventPublisher>,
        config: QualificationConfig,
    ) -> Result<Self, QualificationError> {
        config.validate()?;
        Ok(Self {
            catalog,
            records,
            metrics,
            events,
            clock: Arc::new(SystemTimeSource),
            config,
        })
    }

    /// Replace the wall clock.
    pub fn with_time_source(mut self, clock: Arc<dyn TimeSource>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &QualificationConfig {
        &self.config
    }

    async fn require_record(
        &self,
        record_id: RewardRecordId,
    ) -> Result<RewardRecord, QualificationError> {
        self.records
            .get(record_id)
            .await?
            .ok_or(QualificationError::RewardNotFound(record_id))
    }

    async fn issue(&self, record: RewardRecord) -> Result<QualificationOutcome, QualificationError> {
        match self.records.insert_if_absent(record.clone()).await? {
            InsertOutcome::Inserted => {
                REWARDS_QUALIFIED.inc();
                mx_telemetry::log_reward_event!(
                    info,
                    SUBSYSTEM,
                    "Reward qualified",
                    record.id,
                    member_id = %record.member_id,
                    reward_type = %record.reward_type,
                    definition_version = record.definition_version
                );
                self.events
                    .publish(NetworkEvent::RewardQualified {
                        record_id: record.id,
                        member_id: record.member_id,
                        reward_type: record.reward_type.clone(),
                    })
                    .await;
                Ok(QualificationOutcome::Qualified(record))
            }
            InsertOutcome::AlreadyExists(existing) => {
                debug!(
                    member_id = %existing.member_id,
                    reward_type = %existing.reward_type,
                    "Reward issued concurrently"
                );
                Ok(QualificationOutcome::AlreadyHeld {
                    reward_type: existing.reward_type,
                    status: existing.status,
                })
            }
        }
    }

    async fn evaluate(&self, member_id: MemberId) -> Result<EvaluationReport, QualificationError> {
        let metrics = self.metrics.metrics(member_id).await?;
        let mut report = EvaluationReport {
            member_id,
            outcomes: Vec::new(),
        };

        if !metrics.active && !self.config.evaluate_inactive_members {
            debug!(%member_id, "Skipping reward evaluation for inactive member");
            return Ok(report);
        }

        for definition in self.catalog.active_definitions().await? {
            if let Some(held) = self.records.find(member_id, &definition.reward_type).await? {
                report.outcomes.push(QualificationOutcome::AlreadyHeld {
                    reward_type: held.reward_type,
                    status: held.status,
                });
                continue;
            }

            let progress = evaluate_progress(&definition, &metrics, None);
            let outcome = if progress.eligible {
                let record = RewardRecord::qualify(&definition, &metrics, self.clock.now());
                self.issue(record).await?
            } else {
                QualificationOutcome::NotYetEligible(progress)
            };
            report.outcomes.push(outcome);
        }

        Ok(report)
    }

    /// Apply one admin transition with compare-and-set.
    async fn transition(
        &self,
        record_id: RewardRecordId,
        next: RewardStatus,
        notes: Option<String>,
    ) -> Result<RewardRecord, QualificationError> {
        if let Some(text) = &notes {
            if text.chars().count() > self.config.max_notes_len {
                return Err(QualificationError::NotesTooLong {
                    max: self.config.max_notes_len,
                });
            }
        }

        let mut record = self.require_record(record_id).await?;
        let from = record.status;
        record.transition_to(next, notes, self.clock.now())?;

        match self.records.compare_and_set(record.clone(), from).await {
            Ok(()) => {}
            Err(RecordStoreError::StatusMismatch { actual }) => {
                debug!(%record_id, %from, %actual, "Reward transition lost to a concurrent update");
                return Err(QualificationError::InvalidTransition { from: actual, to: next });
            }
            Err(other) => return Err(other.into()),
        }

        REWARD_TRANSITIONS.with_label_values(&[next.as_str()]).inc();
        mx_telemetry::log_reward_event!(
            info,
            SUBSYSTEM,
            "Reward status changed",
            record.id,
            member_id = %record.member_id,
            %from,
            to = %next
        );
        self.events
            .publish(NetworkEvent::RewardStatusChanged {
                record_id: record.id,
                member_id: record.member_id,
                from,
                to: next,
            })
            .await;

        Ok(record)
    }

    async fn record_failure(&self, err: &QualificationError) {
        let kind = match err {
            QualificationError::Storage(_) => "storage",
            QualificationError::MetricsUnavailable { .. } => "metrics_unavailable",
            _ => return,
        };
        SUBSYSTEM_ERRORS.with_label_values(&[SUBSYSTEM, kind]).inc();

        if let QualificationError::Storage(detail) = err {
            error!(%detail, "Reward storage failure");
            self.events
                .publish(NetworkEvent::CriticalError {
                    subsystem_id: subsystem_ids::REWARD_QUALIFICATION,
                    error: err.to_string(),
                })
                .await;
        }
    }
}

#[async_trait]
impl RewardQualificationApi for RewardQualificationService {
    async fn evaluate_member(
        &self,
        member_id: MemberId,
    ) -> Result<EvaluationReport, QualificationError> {
        let result = self.evaluate(member_id).await;
        if let Err(err) = &result {
            self.record_failure(err).await;
        }
        result
    }

    async fn evaluate_all(&self) -> Result<SweepReport, QualificationError> {
        let candidates = match self.metrics.candidates().await {
            Ok(candidates) => candidates,
            Err(err) => {
                self.record_failure(&err).await;
                return Err(err);
            }
        };

        let mut report = SweepReport::default();
        for member_id in candidates {
            report.evaluated += 1;
            match self.evaluate_member(member_id).await {
                Ok(evaluation) if evaluation.newly_qualified().next().is_some() => {
                    report.qualified += 1
                }
                Ok(_) => {}
                Err(err) => {
                    report.failed += 1;
                    warn!(%member_id, error = %err, "Reward evaluation failed during sweep");
                }
            }
        }

        info!(
            evaluated = report.evaluated,
            qualified = report.qualified,
            failed = report.failed,
            "Reward sweep complete"
        );
        Ok(report)
    }

    async fn reward_progress(
        &self,
        member_id: MemberId,
    ) -> Result<Vec<RewardProgress>, QualificationError> {
        let metrics = self.metrics.metrics(member_id).await?;
        let mut progress = Vec::new();

        for definition in self.catalog.active_definitions().await? {
            let status = self
                .records
                .find(member_id, &definition.reward_type)
                .await?
                .map(|r| r.status);
            progress.push(evaluate_progress(&definition, &metrics, status));
        }
        Ok(progress)
    }

    async fn approve(
        &self,
        record_id: RewardRecordId,
        notes: Option<String>,
    ) -> Result<RewardRecord, QualificationError> {
        self.transition(record_id, RewardStatus::Approved, notes).await
    }

    async fn reject(
        &self,
        record_id: RewardRecordId,
        notes: String,
    ) -> Result<RewardRecord, QualificationError> {
        self.transition(record_id, RewardStatus::Rejected, Some(notes))
            .await
    }

    async fn process(
        &self,
        record_id: RewardRecordId,
        notes: Option<String>,
    ) -> Result<RewardRecord, QualificationError> {
        self.transition(record_id, RewardStatus::Processed, notes).await
    }

    async fn get_record(
        &self,
        record_id: RewardRecordId,
    ) -> Result<RewardRecord, QualificationError> {
        self.require_record(record_id).await
    }

    async fn records_for_member(
        &self,
        member_id: MemberId,
    ) -> Result<Vec<RewardRecord>, QualificationError> {
        Ok(self.records.list_for_member(member_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryRewardRecordStore, StaticRewardCatalog};
    use crate::domain::entities::RewardDefinition;
    use crate::ports::outbound::mocks::{FailingCatalog, MockMetricsProvider};
    use rust_decimal_macros::dec;
    use shared_bus::{EventFilter, EventTopic, InMemoryEventBus};
    use shared_types::{RewardDefinitionId, Timestamp};

    struct FixedClock(Timestamp);

    impl TimeSource for FixedClock {
        fn now(&self) -> Timestamp {
            self.0
        }
    }

    struct Fixture {
        service: Arc<RewardQualificationService>,
        catalog: Arc<StaticRewardCatalog>,
        records: Arc<InMemoryRewardRecordStore>,
        metrics: Arc<MockMetricsProvider>,
        bus: Arc<InMemoryEventBus>,
    }

    fn definition(id: u32, reward_type: &str, self_target: u32, direct_target: u32) -> RewardDefinition {
        RewardDefinition {
            id: RewardDefinitionId(id),
            reward_type: reward_type.into(),
            name: reward_type.to_uppercase(),
            self_invest_target: self_target.into(),
            direct_business_target: direct_target.into(),
            reward_value: dec!(10),
            active: true,
            version: 1,
        }
    }

    fn fixture(config: QualificationConfig) -> Fixture {
        let catalog = Arc::new(
            StaticRewardCatalog::from_definitions([
                definition(1, "bronze", 500, 2000),
                definition(2, "silver", 1000, 5000),
            ])
            .unwrap(),
        );
        let records = Arc::new(InMemoryRewardRecordStore::new());
        let metrics = Arc::new(MockMetricsProvider::default());
        let bus = Arc::new(InMemoryEventBus::new());
        let service = RewardQualificationService::new(
            catalog.clone(),
            records.clone(),
            metrics.clone(),
            bus.clone(),
            config,
        )
        .unwrap()
        .with_time_source(Arc::new(FixedClock(1_700_000_000)));

        Fixture {
            service: Arc::new(service),
            catalog,
            records,
            metrics,
            bus,
        }
    }

    async fn qualified_bronze(f: &Fixture) -> RewardRecord {
        let member = MemberId::new();
        f.metrics.set(member, dec!(600), dec!(0));
        let report = f.service.evaluate_member(member).await.unwrap();
        let record = report.newly_qualified().next().cloned().unwrap();
        record
    }

    #[tokio::test]
    async fn test_evaluate_all_recovers_unevaluated_members() {
        let f = fixture(QualificationConfig::default());
        let held = qualified_bronze(&f).await;
        let eligible = MemberId::new();
        f.metrics.set(eligible, dec!(1200), dec!(0));
        f.metrics.set(MemberId::new(), dec!(10), dec!(0));

        let report = f.service.evaluate_all().await.unwrap();
        assert_eq!(report.evaluated, 3);
        assert_eq!(report.qualified, 1);
        assert_eq!(report.failed, 0);
        assert_eq!(f.records.len(), 3);
        assert_eq!(
            f.service.records_for_member(held.member_id).await.unwrap().len(),
            1
        );

        // A second pass issues nothing
        let again = f.service.evaluate_all().await.unwrap();
        assert_eq!(again.qualified, 0);
        assert_eq!(f.records.len(), 3);
    }

    #[tokio::test]
    async fn test_or_qualification() {
        let f = fixture(QualificationConfig::default());

        // Self investment alone meets bronze
        let by_self = MemberId::new();
        f.metrics.set(by_self, dec!(500), dec!(0));
        let report = f.service.evaluate_member(by_self).await.unwrap();
        let issued: Vec<&str> = report.newly_qualified().map(|r| r.reward_type.as_str()).collect();
        assert_eq!(issued, vec!["bronze"]);

        // Direct business alone meets both
        let by_direct = MemberId::new();
        f.metrics.set(by_direct, dec!(0), dec!(5000));
        let report = f.service.evaluate_member(by_direct).await.unwrap();
        assert_eq!(report.newly_qualified().count(), 2);

        // Neither threshold met
        let neither = MemberId::new();
        f.metrics.set(neither, dec!(499), dec!(1999));
        let report = f.service.evaluate_member(neither).await.unwrap();
        assert_eq!(report.newly_qualified().count(), 0);
        assert!(report
            .outcomes
            .iter()
            .all(|o| matches!(o, QualificationOutcome::NotYetEligible(_))));
    }

    #[tokio::test]
    async fn test_record_snapshots_metrics() {
        let f = fixture(QualificationConfig::default());
        let member = MemberId::new();
        f.metrics.set(member, dec!(750), dec!(120));

        let report = f.service.evaluate_member(member).await.unwrap();
        let record = report.newly_qualified().next().unwrap();
        assert_eq!(record.status, RewardStatus::Qualified);
        assert_eq!(record.self_invest_achieved, dec!(750));
        assert_eq!(record.direct_business_achieved, dec!(120));
        assert_eq!(record.qualification_date, 1_700_000_000);
    }

    #[tokio::test]
    async fn test_evaluation_is_idempotent() {
        let f = fixture(QualificationConfig::default());
        let member = MemberId::new();
        f.metrics.set(member, dec!(600), dec!(0));

        f.service.evaluate_member(member).await.unwrap();
        f.metrics.set(member, dec!(900), dec!(0));
        let second = f.service.evaluate_member(member).await.unwrap();

        assert_eq!(second.newly_qualified().count(), 0);
        assert!(second.outcomes.iter().any(|o| matches!(
            o,
            QualificationOutcome::AlreadyHeld { reward_type, status: RewardStatus::Qualified }
                if reward_type == "bronze"
        )));

        // Snapshot from the first evaluation is kept
        let records = f.service.records_for_member(member).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].self_invest_achieved, dec!(600));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_evaluation_issues_once() {
        let f = fixture(QualificationConfig::default());
        let member = MemberId::new();
        f.metrics.set(member, dec!(1000), dec!(0));

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let service = f.service.clone();
                tokio::spawn(async move { service.evaluate_member(member).await })
            })
            .collect();

        let mut issued = 0;
        for task in tasks {
            issued += task.await.unwrap().unwrap().newly_qualified().count();
        }

        assert_eq!(issued, 2);
        assert_eq!(f.records.len(), 2);
    }

    #[tokio::test]
    async fn test_inactive_member_skipped_by_default() {
        let f = fixture(QualificationConfig::default());
        let member = MemberId::new();
        f.metrics.set(member, dec!(5000), dec!(0));
        f.metrics.set_active(member, false);

        let report = f.service.evaluate_member(member).await.unwrap();
        assert!(report.outcomes.is_empty());
        assert!(f.records.is_empty());

        let permissive = fixture(QualificationConfig {
            evaluate_inactive_members: true,
            ..Default::default()
        });
        permissive.metrics.set(member, dec!(5000), dec!(0));
        permissive.metrics.set_active(member, false);
        let report = permissive.service.evaluate_member(member).await.unwrap();
        assert_eq!(report.newly_qualified().count(), 2);
    }

    #[tokio::test]
    async fn test_catalog_edit_affects_future_checks_only() {
        let f = fixture(QualificationConfig::default());
        let early = qualified_bronze(&f).await;

        let mut harder = definition(1, "bronze", 800, 2000);
        harder.reward_value = dec!(99);
        f.catalog.upsert(harder).unwrap();

        let stored = f.service.get_record(early.id).await.unwrap();
        assert_eq!(stored.definition_version, 1);
        assert_eq!(stored.reward_value, dec!(10));

        let late = MemberId::new();
        f.metrics.set(late, dec!(600), dec!(0));
        let report = f.service.evaluate_member(late).await.unwrap();
        assert_eq!(report.newly_qualified().count(), 0);

        f.metrics.set(late, dec!(800), dec!(0));
        let report = f.service.evaluate_member(late).await.unwrap();
        let record = report.newly_qualified().next().unwrap();
        assert_eq!(record.definition_version, 2);
        assert_eq!(record.reward_value, dec!(99));
    }

    #[tokio::test]
    async fn test_reward_progress() {
        let f = fixture(QualificationConfig::default());
        let record = qualified_bronze(&f).await;

        let progress = f.service.reward_progress(record.member_id).await.unwrap();
        assert_eq!(progress.len(), 2);

        let bronze = &progress[0];
        assert_eq!(bronze.self_invest_progress, dec!(1));
        assert_eq!(bronze.status, Some(RewardStatus::Qualified));

        let silver = &progress[1];
        assert_eq!(silver.self_invest_progress, dec!(0.6));
        assert_eq!(silver.direct_business_progress, dec!(0));
        assert!(!silver.eligible);
        assert!(silver.status.is_none());
    }

    #[tokio::test]
    async fn test_approve_then_process() {
        let f = fixture(QualificationConfig::default());
        let record = qualified_bronze(&f).await;

        let approved = f.service.approve(record.id, None).await.unwrap();
        assert_eq!(approved.status, RewardStatus::Approved);
        assert_eq!(approved.approved_at, Some(1_700_000_000));

        let processed = f
            .service
            .process(record.id, Some("paid out".into()))
            .await
            .unwrap();
        assert_eq!(processed.status, RewardStatus::Processed);
        assert_eq!(processed.processed_at, Some(1_700_000_000));
        assert_eq!(
            f.service.get_record(record.id).await.unwrap().notes.as_deref(),
            Some("paid out")
        );
    }

    #[tokio::test]
    async fn test_illegal_transitions_rejected() {
        let f = fixture(QualificationConfig::default());
        let record = qualified_bronze(&f).await;

        let err = f.service.process(record.id, None).await.unwrap_err();
        assert!(matches!(
            err,
            QualificationError::InvalidTransition {
                from: RewardStatus::Qualified,
                to: RewardStatus::Processed
            }
        ));

        f.service.approve(record.id, None).await.unwrap();
        let err = f
            .service
            .reject(record.id, "too late".into())
            .await
            .unwrap_err();
        assert!(matches!(err, QualificationError::InvalidTransition { .. }));
        assert_eq!(
            f.service.get_record(record.id).await.unwrap().status,
            RewardStatus::Approved
        );
    }

    #[tokio::test]
    async fn test_reject_requires_notes() {
        let f = fixture(QualificationConfig::default());
        let record = qualified_bronze(&f).await;

        let err = f.service.reject(record.id, "   ".into()).await.unwrap_err();
        assert!(matches!(err, QualificationError::NotesRequired));

        let rejected = f
            .service
            .reject(record.id, "duplicate account".into())
            .await
            .unwrap();
        assert_eq!(rejected.status, RewardStatus::Rejected);

        // Terminal
        assert!(f.service.approve(record.id, None).await.is_err());
    }

    #[tokio::test]
    async fn test_notes_length_limit() {
        let f = fixture(QualificationConfig {
            max_notes_len: 8,
            ..Default::default()
        });
        let record = qualified_bronze(&f).await;

        let err = f
            .service
            .reject(record.id, "far too long a reason".into())
            .await
            .unwrap_err();
        assert!(matches!(err, QualificationError::NotesTooLong { max: 8 }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_admins_one_wins() {
        let f = fixture(QualificationConfig::default());
        let id = qualified_bronze(&f).await.id;

        let approve = {
            let service = f.service.clone();
            tokio::spawn(async move { service.approve(id, None).await })
        };
        let reject = {
            let service = f.service.clone();
            tokio::spawn(async move { service.reject(id, "fraud".into()).await })
        };

        let results = [approve.await.unwrap(), reject.await.unwrap()];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, QualificationError::InvalidTransition { .. })));
    }

    #[tokio::test]
    async fn test_unknown_record() {
        let f = fixture(QualificationConfig::default());
        let err = f
            .service
            .approve(RewardRecordId::new(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, QualificationError::RewardNotFound(_)));
    }

    #[tokio::test]
    async fn test_events_published() {
        let f = fixture(QualificationConfig::default());
        let mut sub = f.bus.subscribe(EventFilter::topics(vec![EventTopic::Rewards]));

        let record = qualified_bronze(&f).await;
        f.service.approve(record.id, None).await.unwrap();

        match sub.recv().await {
            Some(NetworkEvent::RewardQualified { record_id, reward_type, .. }) => {
                assert_eq!(record_id, record.id);
                assert_eq!(reward_type, "bronze");
            }
            other => panic!("expected RewardQualified, got {other:?}"),
        }
        match sub.recv().await {
            Some(NetworkEvent::RewardStatusChanged { from, to, .. }) => {
                assert_eq!(from, RewardStatus::Qualified);
                assert_eq!(to, RewardStatus::Approved);
            }
            other => panic!("expected RewardStatusChanged, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_catalog_failure_is_storage_error() {
        let metrics = Arc::new(MockMetricsProvider::default());
        let member = MemberId::new();
        metrics.set(member, dec!(1), dec!(1));
        let bus = Arc::new(InMemoryEventBus::new());
        let mut critical = bus.subscribe(EventFilter::topics(vec![EventTopic::Critical]));

        let service = RewardQualificationService::new(
            Arc::new(FailingCatalog),
            Arc::new(InMemoryRewardRecordStore::new()),
            metrics,
            bus.clone(),
            QualificationConfig::default(),
        )
        .unwrap();

        let err = service.evaluate_member(member).await.unwrap_err();
        assert!(matches!(err, QualificationError::Storage(_)));
        assert!(matches!(
            critical.recv().await,
            Some(NetworkEvent::CriticalError { subsystem_id, .. })
                if subsystem_id == subsystem_ids::REWARD_QUALIFICATION
        ));
    }

    #[tokio::test]
    async fn test_unknown_member_metrics() {
        let f = fixture(QualificationConfig::default());
        let err = f.service.evaluate_member(MemberId::new()).await.unwrap_err();
        assert!(matches!(err, QualificationError::MetricsUnavailable { .. }));
    }
}
