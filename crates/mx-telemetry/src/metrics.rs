//! Prometheus metrics for Matrix-Network subsystems.
//!
//! All metrics follow the naming convention: `mx_<subsystem>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., members_registered_total)
//! - **Histogram**: Distribution of values (e.g., placement_search_levels)

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, linear_buckets, Counter, CounterVec, Encoder, Histogram, HistogramOpts,
    Opts, Registry, TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // MEMBER GRAPH METRICS (Subsystem 1)
    // =========================================================================

    /// Members persisted by the signup flow (root included)
    pub static ref MEMBERS_REGISTERED: Counter = Counter::new(
        "mx_graph_members_registered_total",
        "Total number of members registered"
    ).expect("metric creation failed");

    /// Placement slot claims lost to a concurrent signup
    pub static ref SLOT_CLAIM_CONFLICTS: Counter = Counter::new(
        "mx_graph_slot_claim_conflicts_total",
        "Slot claims rejected because the slot or parent was taken concurrently"
    ).expect("metric creation failed");

    /// Signups that gave up on placement
    pub static ref PLACEMENT_FAILURES: CounterVec = CounterVec::new(
        Opts::new("mx_graph_placement_failures_total", "Placement failures by reason"),
        &["reason"]  // reason: retries_exhausted/tree_exhausted/storage
    ).expect("metric creation failed");

    /// Levels descended below the sponsor before a free node was found
    pub static ref PLACEMENT_SEARCH_LEVELS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "mx_graph_placement_search_levels",
            "Depth below the sponsor at which placement found a free slot"
        ).buckets(linear_buckets(0.0, 1.0, 16).unwrap_or_default())
    ).expect("metric creation failed");

    /// Downline aggregations cut short by a traversal bound
    pub static ref AGGREGATIONS_TRUNCATED: Counter = Counter::new(
        "mx_graph_aggregations_truncated_total",
        "Downline aggregations that stopped at a depth or node bound"
    ).expect("metric creation failed");

    /// Time spent aggregating a downline
    pub static ref AGGREGATION_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "mx_graph_aggregation_duration_seconds",
            "Time spent computing downline aggregates"
        ).buckets(exponential_buckets(0.0001, 2.0, 16).unwrap_or_default())
    ).expect("metric creation failed");

    // =========================================================================
    // REWARD QUALIFICATION METRICS (Subsystem 2)
    // =========================================================================

    /// Reward records created by evaluation
    pub static ref REWARDS_QUALIFIED: Counter = Counter::new(
        "mx_rewards_qualified_total",
        "Total number of reward records created"
    ).expect("metric creation failed");

    /// Administrative transitions by target status
    pub static ref REWARD_TRANSITIONS: CounterVec = CounterVec::new(
        Opts::new("mx_rewards_transitions_total", "Reward status transitions"),
        &["to"]  // to: approved/processed/rejected
    ).expect("metric creation failed");

    // =========================================================================
    // ERROR METRICS
    // =========================================================================

    /// Subsystem errors by type
    pub static ref SUBSYSTEM_ERRORS: CounterVec = CounterVec::new(
        Opts::new("mx_subsystem_errors_total", "Errors by subsystem and type"),
        &["subsystem", "error_type"]
    ).expect("metric creation failed");
}

/// Handle to the registered metrics
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Member graph
        Box::new(MEMBERS_REGISTERED.clone()),
        Box::new(SLOT_CLAIM_CONFLICTS.clone()),
        Box::new(PLACEMENT_FAILURES.clone()),
        Box::new(PLACEMENT_SEARCH_LEVELS.clone()),
        Box::new(AGGREGATIONS_TRUNCATED.clone()),
        Box::new(AGGREGATION_DURATION.clone()),
        // Rewards
        Box::new(REWARDS_QUALIFIED.clone()),
        Box::new(REWARD_TRANSITIONS.clone()),
        // Errors
        Box::new(SUBSYSTEM_ERRORS.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}
