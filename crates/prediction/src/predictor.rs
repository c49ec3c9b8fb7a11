//! The predictor capability trait and its error taxonomy.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use haulsense_core::TelemetryReading;

/// A health prediction for one machine.
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    /// Predicted machine health, 0-100.
    pub health_score: f64,
    /// How much to trust the score, 0-1.
    pub confidence: f64,
    /// Which model produced the score.
    pub model_version: String,
}

/// Why a predictor failed.
///
/// Everything except [`Invalid`](PredictorError::Invalid) counts as an
/// infrastructure failure: it trips the circuit breaker and degrades to the
/// rule-based fallback. `Invalid` is a caller error and must do neither.
#[derive(Debug, thiserror::Error)]
pub enum PredictorError {
    /// The prediction did not complete within the deadline.
    #[error("Prediction timed out after {0:?}")]
    Timeout(Duration),

    /// The backend is down or unreachable.
    #[error("Prediction backend unavailable: {0}")]
    Unavailable(String),

    /// The backend ran and reported an internal failure.
    #[error("Prediction backend error: {0}")]
    Backend(String),

    /// The backend rejected the input itself.
    #[error("Invalid prediction input: {0}")]
    Invalid(String),
}

impl PredictorError {
    /// Whether this error should count against the circuit breaker.
    pub fn is_expected(&self) -> bool {
        !matches!(self, PredictorError::Invalid(_))
    }
}

/// Something that can predict machine health from a telemetry reading.
///
/// Implementations wrap the actual model backend (remote inference service,
/// in-process model, ...). They should return promptly or honor cancellation;
/// the orchestrator enforces its own deadline around the call.
#[async_trait]
pub trait Predictor: Send + Sync {
    async fn predict(&self, reading: &TelemetryReading) -> Result<Prediction, PredictorError>;
}
