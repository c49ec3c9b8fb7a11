//! Fire-and-forget observability sinks.
//!
//! The breaker, quality monitor, and orchestrator all report what they did
//! through a [`MetricsSink`]. Sinks are strictly fire-and-forget: every
//! method takes `&self`, returns `()`, and implementations must not panic —
//! a broken sink must never affect the decision pipeline.

use std::sync::Mutex;
use std::time::Duration;

use crate::metric_names::{METRIC_BREAKER_TRANSITION, METRIC_PREDICTION, METRIC_QUALITY_ISSUE};

/// Recipient of pipeline telemetry.
///
/// Field values are passed as plain strings so that sink implementations do
/// not depend on the crates that define the richer enums (breaker states,
/// issue kinds, prediction sources).
pub trait MetricsSink: Send + Sync {
    /// A circuit breaker moved from `from` to `to`.
    fn record_breaker_transition(&self, breaker: &str, from: &str, to: &str);

    /// The quality monitor detected an issue on a machine.
    fn record_quality_issue(&self, machine_id: &str, kind: &str, severity: &str);

    /// A prediction completed for a machine.
    fn record_prediction(&self, machine_id: &str, source: &str, health_score: f64, took: Duration);
}

// ---------------------------------------------------------------------------
// TracingSink
// ---------------------------------------------------------------------------

/// Default sink: emits one `tracing` event per record.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl MetricsSink for TracingSink {
    fn record_breaker_transition(&self, breaker: &str, from: &str, to: &str) {
        tracing::info!(
            metric = METRIC_BREAKER_TRANSITION,
            breaker,
            from,
            to,
            "Circuit breaker transition",
        );
    }

    fn record_quality_issue(&self, machine_id: &str, kind: &str, severity: &str) {
        tracing::warn!(
            metric = METRIC_QUALITY_ISSUE,
            machine = machine_id,
            kind,
            severity,
            "Data quality issue detected",
        );
    }

    fn record_prediction(&self, machine_id: &str, source: &str, health_score: f64, took: Duration) {
        tracing::info!(
            metric = METRIC_PREDICTION,
            machine = machine_id,
            source,
            health_score,
            took_ms = took.as_millis() as u64,
            "Prediction completed",
        );
    }
}

// ---------------------------------------------------------------------------
// NullSink
// ---------------------------------------------------------------------------

/// Discards every record. Useful when a caller wants no observability at all.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl MetricsSink for NullSink {
    fn record_breaker_transition(&self, _breaker: &str, _from: &str, _to: &str) {}

    fn record_quality_issue(&self, _machine_id: &str, _kind: &str, _severity: &str) {}

    fn record_prediction(
        &self,
        _machine_id: &str,
        _source: &str,
        _health_score: f64,
        _took: Duration,
    ) {
    }
}

// ---------------------------------------------------------------------------
// RecordingSink
// ---------------------------------------------------------------------------

/// One captured sink record.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    BreakerTransition {
        breaker: String,
        from: String,
        to: String,
    },
    QualityIssue {
        machine_id: String,
        kind: String,
        severity: String,
    },
    Prediction {
        machine_id: String,
        source: String,
        health_score: f64,
    },
}

/// Captures every record in memory; intended for tests.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SinkEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().expect("sink lock poisoned").clone()
    }

    /// Number of breaker transitions recorded.
    pub fn transition_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, SinkEvent::BreakerTransition { .. }))
            .count()
    }
}

impl MetricsSink for RecordingSink {
    fn record_breaker_transition(&self, breaker: &str, from: &str, to: &str) {
        self.events
            .lock()
            .expect("sink lock poisoned")
            .push(SinkEvent::BreakerTransition {
                breaker: breaker.to_string(),
                from: from.to_string(),
                to: to.to_string(),
            });
    }

    fn record_quality_issue(&self, machine_id: &str, kind: &str, severity: &str) {
        self.events
            .lock()
            .expect("sink lock poisoned")
            .push(SinkEvent::QualityIssue {
                machine_id: machine_id.to_string(),
                kind: kind.to_string(),
                severity: severity.to_string(),
            });
    }

    fn record_prediction(
        &self,
        machine_id: &str,
        source: &str,
        health_score: f64,
        _took: Duration,
    ) {
        self.events
            .lock()
            .expect("sink lock poisoned")
            .push(SinkEvent::Prediction {
                machine_id: machine_id.to_string(),
                source: source.to_string(),
                health_score,
            });
    }
}
