//! Metrics collection using Prometheus

use crate::types::MatchKind;
use anyhow::Result;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;
use std::time::Duration;

/// Counters for pending-match workflow transitions
#[derive(Clone)]
pub struct WorkflowMetrics {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Matches submitted into a pending list, by kind
    pub submitted_total: IntCounterVec,

    /// Matches whose second side confirmed
    pub confirmed_total: IntCounter,

    /// Matches rejected by a participant
    pub rejected_total: IntCounter,

    /// Matches vetoed by staff
    pub vetoed_total: IntCounter,

    /// Matches approved into permanent history, by kind
    pub approved_total: IntCounterVec,

    /// Matches recorded directly by staff, by kind
    pub recorded_total: IntCounterVec,

    /// Pending entries purged by cleanup, by reason
    pub purged_total: IntCounterVec,

    /// Time spent inside the rating engine
    pub rating_update_duration: Histogram,
}

impl WorkflowMetrics {
    /// Create a new metrics collector with its own registry
    pub fn new() -> Result<Self> {
        Self::with_registry(Arc::new(Registry::new()))
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let submitted_total = IntCounterVec::new(
            Opts::new("ladder_matches_submitted_total", "Total matches submitted"),
            &["kind"],
        )?;
        registry.register(Box::new(submitted_total.clone()))?;

        let confirmed_total = IntCounter::new(
            "ladder_matches_confirmed_total",
            "Total matches confirmed by both sides",
        )?;
        registry.register(Box::new(confirmed_total.clone()))?;

        let rejected_total =
            IntCounter::new("ladder_matches_rejected_total", "Total matches rejected")?;
        registry.register(Box::new(rejected_total.clone()))?;

        let vetoed_total = IntCounter::new("ladder_matches_vetoed_total", "Total matches vetoed")?;
        registry.register(Box::new(vetoed_total.clone()))?;

        let approved_total = IntCounterVec::new(
            Opts::new("ladder_matches_approved_total", "Total matches approved"),
            &["kind"],
        )?;
        registry.register(Box::new(approved_total.clone()))?;

        let recorded_total = IntCounterVec::new(
            Opts::new(
                "ladder_matches_recorded_total",
                "Total matches recorded directly by staff",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(recorded_total.clone()))?;

        let purged_total = IntCounterVec::new(
            Opts::new(
                "ladder_pending_purged_total",
                "Total pending matches purged by cleanup",
            ),
            &["reason"],
        )?;
        registry.register(Box::new(purged_total.clone()))?;

        let rating_update_duration = Histogram::with_opts(
            HistogramOpts::new(
                "ladder_rating_update_duration_seconds",
                "Rating engine update time",
            )
            .buckets(vec![0.00001, 0.0001, 0.001, 0.01, 0.1]),
        )?;
        registry.register(Box::new(rating_update_duration.clone()))?;

        Ok(Self {
            registry,
            submitted_total,
            confirmed_total,
            rejected_total,
            vetoed_total,
            approved_total,
            recorded_total,
            purged_total,
            rating_update_duration,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub fn record_submitted(&self, kind: MatchKind) {
        self.submitted_total
            .with_label_values(&[kind.as_str()])
            .inc();
    }

    pub fn record_approved(&self, kind: MatchKind, duration: Duration) {
        self.approved_total
            .with_label_values(&[kind.as_str()])
            .inc();
        self.rating_update_duration.observe(duration.as_secs_f64());
    }

    pub fn record_recorded(&self, kind: MatchKind, duration: Duration) {
        self.recorded_total
            .with_label_values(&[kind.as_str()])
            .inc();
        self.rating_update_duration.observe(duration.as_secs_f64());
    }

    pub fn record_purged(&self, reason: &str) {
        self.purged_total.with_label_values(&[reason]).inc();
    }

    /// Render all metrics in the Prometheus text format
    pub fn gather_text(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
