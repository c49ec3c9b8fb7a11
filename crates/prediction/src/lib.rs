//! Prediction orchestration with quality gating and graceful degradation.
//!
//! [`PredictionOrchestrator`] ties the pipeline together: it validates and
//! quality-checks each reading, routes the ML call through the `ml_model`
//! circuit breaker, and falls back to rule-based scoring whenever the model
//! is unavailable — the fleet always gets a health score, just a less
//! confident one.

pub mod fallback;
pub mod orchestrator;
pub mod predictor;

pub use fallback::{fallback_prediction, FALLBACK_CONFIDENCE, FALLBACK_MODEL_VERSION};
pub use orchestrator::{
    PredictionError, PredictionOrchestrator, PredictionOutcome, PredictionSource,
};
pub use predictor::{Prediction, Predictor, PredictorError};
