//! Well-known metric name constants.
//!
//! These are the canonical names used by [`MetricsSink`](crate::observability::MetricsSink)
//! implementations and by any downstream exporter that aggregates them.

/// Emitted once per circuit breaker state transition.
pub const METRIC_BREAKER_TRANSITION: &str = "breaker_transition";

/// Emitted once per detected data quality issue.
pub const METRIC_QUALITY_ISSUE: &str = "quality_issue";

/// Emitted once per completed prediction (primary or fallback).
pub const METRIC_PREDICTION: &str = "prediction";

/// Well-known breaker name for the ML model dependency.
pub const BREAKER_ML_MODEL: &str = "ml_model";

/// Well-known breaker name for the database dependency.
pub const BREAKER_DATABASE: &str = "database";

/// Well-known breaker name for external API dependencies.
pub const BREAKER_EXTERNAL_API: &str = "external_api";
