//! Member Graph Service
//!
//! Main service implementing MemberGraphApi.

use crate::adapters::SystemTimeSource;
use crate::algorithms::{
    compute_downline_aggregates, resolve_placement, sponsor_ancestors, IdentifierAllocator,
    TraversalLimits,
};
use crate::config::NetworkConfig;
use crate::domain::entities::{
    DownlineAggregates, InvestmentRefresh, IssuedCodes, Member, SignupReceipt, SignupRequest,
    StructureReport,
};
use crate::domain::errors::{NetworkError, StoreError};
use crate::domain::invariants;
use crate::domain::value_objects::{is_code, SponsorReference, ROOT_SENTINEL};
use crate::ports::inbound::MemberGraphApi;
use crate::ports::outbound::{InvestmentLedger, MemberStore, TimeSource};
use async_trait::async_trait;
use mx_telemetry::metrics::{AGGREGATION_DURATION, SUBSYSTEM_ERRORS};
use mx_telemetry::{
    time_histogram, AGGREGATIONS_TRUNCATED, MEMBERS_REGISTERED, PLACEMENT_FAILURES,
    PLACEMENT_SEARCH_LEVELS, SLOT_CLAIM_CONFLICTS,
};
use shared_bus::{subsystem_ids, EventPublisher, NetworkEvent};
use shared_types::MemberId;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

const SUBSYSTEM: &str = "member-graph";

/// Member Graph Service
///
/// Orchestrates the signup pipeline:
/// 1. Validate the username
/// 2. Resolve the sponsor reference
/// 3. Issue sponsor and trace codes
/// 4. Resolve placement and claim the slot, retrying lost claims with backoff
/// 5. Publish `MemberJoined`
pub struct MemberGraphService {
    store: Arc<dyn MemberStore>,
    ledger: Arc<dyn InvestmentLedger>,
    events: Arc<dyn EventPublisher>,
    clock: Arc<dyn TimeSource>,
    allocator: IdentifierAllocator,
    config: NetworkConfig,
}

impl MemberGraphService {
    /// Create a new service. Fails on an invalid configuration.
    pub fn new(
        store: Arc<dyn MemberStore>,
        ledger: Arc<dyn InvestmentLedger>,
        events: Arc<dyn EventPublisher>,
        config: NetworkConfig,
    ) -> Result<Self, NetworkError> {
        config.validate()?;

        let allocator = match config.code_seed {
            Some(seed) => IdentifierAllocator::with_seed(config.max_code_attempts, seed),
            None => IdentifierAllocator::new(config.max_code_attempts),
        };

        Ok(Self {
            store,
            ledger,
            events,
            clock: Arc::new(SystemTimeSource),
            allocator,
            config,
        })
    }

    /// Replace the wall clock.
    pub fn with_time_source(mut self, clock: Arc<dyn TimeSource>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    fn validate_username(&self, raw: &str) -> Result<String, NetworkError> {
        let username = raw.trim();
        let ambiguous = username.eq_ignore_ascii_case(ROOT_SENTINEL)
            || is_code(username, &self.config.sponsor_code_prefix);

        if username.is_empty() || username.chars().any(char::is_whitespace) || ambiguous {
            return Err(NetworkError::InvalidUsername(raw.to_string()));
        }
        Ok(username.to_string())
    }

    async fn issue_codes(&self) -> Result<IssuedCodes, NetworkError> {
        let store = self.store.as_ref();
        Ok(IssuedCodes {
            sponsor_code: self
                .allocator
                .allocate(&self.config.sponsor_code_prefix, store)
                .await?,
            trace_code: self
                .allocator
                .allocate(&self.config.trace_code_prefix, store)
                .await?,
        })
    }

    async fn resolve_sponsor(&self, raw: &str) -> Result<Member, NetworkError> {
        let reference = match SponsorReference::parse(raw, &self.config.sponsor_code_prefix) {
            Some(reference) => reference,
            None if self.config.fallback_to_root => SponsorReference::Root,
            None => {
                return Err(NetworkError::InvalidSponsor {
                    reference: "<none>".to_string(),
                })
            }
        };

        let found = match &reference {
            SponsorReference::Root => self.store.root().await?,
            SponsorReference::Code(code) => self.store.find_by_sponsor_code(code).await?,
            SponsorReference::Username(name) => self.store.find_by_username(name).await?,
        };

        match found {
            Some(sponsor) if sponsor.active => Ok(sponsor),
            Some(sponsor) => {
                debug!(sponsor_id = %sponsor.id, "Sponsor is deactivated");
                Err(NetworkError::InvalidSponsor {
                    reference: raw.to_string(),
                })
            }
            None => Err(NetworkError::InvalidSponsor {
                reference: raw.to_string(),
            }),
        }
    }

    /// Resolve placement and claim the slot.
    ///
    /// A lost claim re-resolves from scratch after an exponential backoff.
    /// A duplicate code re-issues codes without backing off and does not
    /// count as a lost claim; re-issues are bounded by `max_code_attempts`.
    async fn place_member(&self, username: &str, sponsor: &Member) -> Result<Member, NetworkError> {
        let width = self.config.matrix_width;
        let attempts = self.config.slot_claim_max_retries + 1;
        let mut codes = self.issue_codes().await?;
        let mut lost = 0u32;
        let mut reissues = 0u32;

        loop {
            let decision = resolve_placement(
                self.store.as_ref(),
                sponsor.id,
                width,
                self.config.max_placement_levels,
            )
            .await?;
            PLACEMENT_SEARCH_LEVELS.observe(f64::from(decision.depth));

            let member = Member::placed(
                username,
                sponsor.id,
                &decision,
                codes.clone(),
                self.clock.now(),
            );

            match self.store.insert_member(member.clone(), width).await {
                Ok(()) => return Ok(member),
                Err(StoreError::SlotTaken { parent_id, slot }) => {
                    SLOT_CLAIM_CONFLICTS.inc();
                    warn!(%parent_id, slot, attempt = lost + 1, "Slot claim lost, retrying");
                }
                Err(StoreError::ParentFull { parent_id }) => {
                    SLOT_CLAIM_CONFLICTS.inc();
                    warn!(%parent_id, attempt = lost + 1, "Placement parent filled, retrying");
                }
                Err(StoreError::DuplicateCode(code)) => {
                    reissues += 1;
                    if reissues >= self.config.max_code_attempts {
                        return Err(NetworkError::AllocationExhausted {
                            prefix: self.config.sponsor_code_prefix.clone(),
                            attempts: reissues,
                        });
                    }
                    debug!(code = %code, reissues, "Issued code taken concurrently, reissuing");
                    codes = self.issue_codes().await?;
                    continue;
                }
                Err(other) => return Err(other.into()),
            }

            lost += 1;
            if lost >= attempts {
                break;
            }
            tokio::time::sleep(self.config.slot_claim_backoff(lost)).await;
        }

        Err(NetworkError::PlacementFailed { attempts })
    }

    async fn register(&self, request: SignupRequest) -> Result<SignupReceipt, NetworkError> {
        let username = self.validate_username(&request.username)?;

        if self.store.find_by_username(&username).await?.is_some() {
            return Err(NetworkError::DuplicateUsername(username));
        }

        let sponsor = self.resolve_sponsor(&request.sponsor_reference).await?;
        let member = self.place_member(&username, &sponsor).await?;

        MEMBERS_REGISTERED.inc();
        mx_telemetry::log_member_event!(
            info,
            SUBSYSTEM,
            "Member registered",
            member.id,
            sponsor_id = %sponsor.id,
            placement_parent_id = ?member.placement_parent_id,
            placement_slot = member.placement_slot
        );

        self.events
            .publish(NetworkEvent::MemberJoined {
                member_id: member.id,
                sponsor_id: member.sponsor_id,
                placement_parent_id: member.placement_parent_id,
                placement_slot: member.placement_slot,
            })
            .await;

        Ok(SignupReceipt::from(&member))
    }

    async fn record_signup_failure(&self, err: &NetworkError) {
        PLACEMENT_FAILURES.with_label_values(&[err.kind()]).inc();
        SUBSYSTEM_ERRORS
            .with_label_values(&[SUBSYSTEM, err.kind()])
            .inc();

        // Internal kind goes to the log only; callers get `user_message()`
        match err {
            NetworkError::Storage(detail) => {
                error!(error_kind = err.kind(), %detail, "Signup failed");
                self.events
                    .publish(NetworkEvent::CriticalError {
                        subsystem_id: subsystem_ids::MEMBER_GRAPH,
                        error: err.to_string(),
                    })
                    .await;
            }
            _ => warn!(error_kind = err.kind(), error = %err, "Signup failed"),
        }
    }

    fn traversal_limits(&self, max_depth: Option<u32>) -> TraversalLimits {
        TraversalLimits {
            max_depth,
            depth_guard: self.config.max_traversal_depth,
            max_nodes: self.config.max_aggregation_nodes,
        }
    }

    async fn require_member(&self, member_id: MemberId) -> Result<Member, NetworkError> {
        self.store
            .get(member_id)
            .await?
            .ok_or(NetworkError::MemberNotFound(member_id))
    }
}

#[async_trait]
impl MemberGraphApi for MemberGraphService {
    async fn bootstrap_root(&self, username: &str) -> Result<SignupReceipt, NetworkError> {
        let username = self.validate_username(username)?;

        if self.store.root().await?.is_some() {
            return Err(NetworkError::RootAlreadyExists);
        }

        let codes = self.issue_codes().await?;
        let root = Member::root(
            username,
            codes.sponsor_code,
            codes.trace_code,
            self.clock.now(),
        );
        self.store
            .insert_member(root.clone(), self.config.matrix_width)
            .await?;

        MEMBERS_REGISTERED.inc();
        info!(member_id = %root.id, sponsor_code = %root.sponsor_code, "Root member created");

        self.events
            .publish(NetworkEvent::MemberJoined {
                member_id: root.id,
                sponsor_id: None,
                placement_parent_id: None,
                placement_slot: root.placement_slot,
            })
            .await;

        Ok(SignupReceipt::from(&root))
    }

    async fn register_member(
        &self,
        request: SignupRequest,
    ) -> Result<SignupReceipt, NetworkError> {
        let result = self.register(request).await;
        if let Err(err) = &result {
            self.record_signup_failure(err).await;
        }
        result
    }

    async fn resolve_placement(
        &self,
        sponsor_id: MemberId,
        matrix_width: u32,
    ) -> Result<MemberId, NetworkError> {
        let decision = resolve_placement(
            self.store.as_ref(),
            sponsor_id,
            matrix_width,
            self.config.max_placement_levels,
        )
        .await?;
        Ok(decision.parent_id)
    }

    async fn compute_downline_aggregates(
        &self,
        member_id: MemberId,
        max_depth: Option<u32>,
    ) -> Result<DownlineAggregates, NetworkError> {
        let _timer = time_histogram!(AGGREGATION_DURATION);

        let aggregates = compute_downline_aggregates(
            self.store.as_ref(),
            member_id,
            self.traversal_limits(max_depth),
        )
        .await?;

        if aggregates.truncated.is_some() {
            AGGREGATIONS_TRUNCATED.inc();
        }
        Ok(aggregates)
    }

    async fn sponsor_ancestors(
        &self,
        member_id: MemberId,
        max_depth: Option<u32>,
    ) -> Result<Vec<Member>, NetworkError> {
        let depth = max_depth
            .filter(|d| *d > 0)
            .unwrap_or(self.config.max_traversal_depth);
        sponsor_ancestors(self.store.as_ref(), member_id, depth).await
    }

    async fn refresh_investment_totals(
        &self,
        member_id: MemberId,
    ) -> Result<InvestmentRefresh, NetworkError> {
        let member = self.require_member(member_id).await?;

        let total = self.ledger.active_investment_total(member_id).await?;
        self.store.update_self_investment(member_id, total).await?;

        let mut affected_members = vec![member_id];
        let mut sponsor_direct_business = None;

        if let Some(sponsor_id) = member.sponsor_id {
            // Runs after the write above so the fresh total is included
            let direct = self.store.recompute_direct_business(sponsor_id).await?;
            sponsor_direct_business = Some(direct);
            affected_members.push(sponsor_id);
        }

        debug!(
            %member_id,
            self_investment_total = %total,
            sponsor_direct_business = ?sponsor_direct_business,
            "Investment totals refreshed"
        );

        self.events
            .publish(NetworkEvent::InvestmentTotalsRefreshed {
                member_id,
                self_investment_total: total,
                affected_members: affected_members.clone(),
            })
            .await;

        Ok(InvestmentRefresh {
            member_id,
            self_investment_total: total,
            sponsor_id: member.sponsor_id,
            sponsor_direct_business,
            affected_members,
        })
    }

    async fn deactivate_member(&self, member_id: MemberId) -> Result<(), NetworkError> {
        let member = self.require_member(member_id).await?;
        if !member.active {
            return Ok(());
        }

        self.store.set_active(member_id, false).await?;
        info!(%member_id, "Member deactivated");

        self.events
            .publish(NetworkEvent::MemberDeactivated { member_id })
            .await;
        Ok(())
    }

    async fn get_member(&self, member_id: MemberId) -> Result<Member, NetworkError> {
        self.require_member(member_id).await
    }

    async fn audit_structure(&self) -> Result<StructureReport, NetworkError> {
        let members = self.store.snapshot().await?;
        let report = invariants::audit(&members, self.config.matrix_width);

        if report.is_healthy() {
            info!(members = report.members_checked, "Structure audit passed");
        } else {
            error!(
                members = report.members_checked,
                violations = report.violations.len(),
                "Structure audit found violations"
            );
            self.events
                .publish(NetworkEvent::CriticalError {
                    subsystem_id: subsystem_ids::MEMBER_GRAPH,
                    error: format!("{} structural violations", report.violations.len()),
                })
                .await;
        }

        Ok(report)
    }

    async fn invested_members(&self) -> Result<Vec<MemberId>, NetworkError> {
        Ok(self
            .store
            .snapshot()
            .await?
            .into_iter()
            .filter(|m| !m.self_investment_total.is_zero() || !m.direct_business_total.is_zero())
            .map(|m| m.id)
            .collect())
    }
}
