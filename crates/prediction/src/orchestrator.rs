//! Prediction orchestration: quality gating, breaker-guarded model calls,
//! and rule-based degradation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use haulsense_breaker::{BreakerRegistry, CallError};
use haulsense_core::{CoreError, MetricsSink, TelemetryReading, Timestamp, TracingSink};
use haulsense_quality::{DataQualityMonitor, QualityReport};

use crate::fallback::fallback_prediction;
use crate::predictor::{Prediction, Predictor, PredictorError};

/// Quality score below which prediction confidence is attenuated.
const QUALITY_ATTENUATION_THRESHOLD: f64 = 80.0;

/// Predicted health below which a low-health alert is logged.
const LOW_HEALTH_ALERT_THRESHOLD: f64 = 70.0;

// ---------------------------------------------------------------------------
// Outcome types
// ---------------------------------------------------------------------------

/// Where a prediction came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionSource {
    /// The real model, through the circuit breaker.
    Primary,
    /// The rule-based fallback.
    Fallback,
}

impl PredictionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionSource::Primary => "primary",
            PredictionSource::Fallback => "fallback",
        }
    }
}

/// A completed prediction with everything a caller needs to judge it.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionOutcome {
    pub machine_id: String,
    pub prediction: Prediction,
    pub source: PredictionSource,
    /// The quality verdict for the reading the prediction was made from.
    pub quality: QualityReport,
    /// Wall time the whole orchestration took.
    pub elapsed: Duration,
    pub timestamp: Timestamp,
}

/// Errors the orchestrator surfaces to callers.
///
/// Infrastructure failures never appear here; they degrade to the fallback.
/// Only caller errors fail a prediction outright.
#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    /// The reading failed validation, or a breaker config was invalid.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The model backend rejected the input itself.
    #[error("Predictor rejected the reading: {0}")]
    Rejected(String),
}

// ---------------------------------------------------------------------------
// PredictionOrchestrator
// ---------------------------------------------------------------------------

/// Runs the full decision pipeline for one reading.
///
/// Holds the quality monitor and breaker registry as explicit shared
/// dependencies; the predictor is passed per call so one orchestrator can
/// serve several model backends.
pub struct PredictionOrchestrator {
    monitor: Arc<DataQualityMonitor>,
    registry: Arc<BreakerRegistry>,
    sink: Arc<dyn MetricsSink>,
}

impl Default for PredictionOrchestrator {
    fn default() -> Self {
        Self::new(
            Arc::new(DataQualityMonitor::default()),
            Arc::new(BreakerRegistry::default()),
            Arc::new(TracingSink),
        )
    }
}

impl PredictionOrchestrator {
    pub fn new(
        monitor: Arc<DataQualityMonitor>,
        registry: Arc<BreakerRegistry>,
        sink: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            monitor,
            registry,
            sink,
        }
    }

    /// The quality monitor this orchestrator feeds.
    pub fn monitor(&self) -> &Arc<DataQualityMonitor> {
        &self.monitor
    }

    /// The breaker registry guarding this orchestrator's dependencies.
    pub fn registry(&self) -> &Arc<BreakerRegistry> {
        &self.registry
    }

    /// Predict machine health for one reading.
    ///
    /// Pipeline: validate the reading, quality-check it (this also updates
    /// the machine's profile), then call the predictor through the
    /// `ml_model` breaker, bounded by `deadline` when one is given. If the
    /// circuit is open or the model fails in an expected way, the rule-based
    /// fallback supplies the prediction instead — an `Err` here means the
    /// reading itself was unusable, never that infrastructure was down.
    ///
    /// A quality score below 80 attenuates the model's confidence by
    /// `score / 100`. Fallback confidence is fixed at 0.6 regardless of
    /// quality; the rules only look at the reading in hand.
    pub async fn predict(
        &self,
        predictor: &dyn Predictor,
        reading: &TelemetryReading,
        deadline: Option<Duration>,
    ) -> Result<PredictionOutcome, PredictionError> {
        let started = Instant::now();
        reading.validate()?;

        let quality = self.monitor.check(reading);
        let breaker = self.registry.ml_model()?;

        let attempt = breaker
            .call(PredictorError::is_expected, || async {
                match deadline {
                    Some(limit) => tokio::time::timeout(limit, predictor.predict(reading))
                        .await
                        .unwrap_or_else(|_| Err(PredictorError::Timeout(limit))),
                    None => predictor.predict(reading).await,
                }
            })
            .await;

        let (mut prediction, source) = match attempt {
            Ok(prediction) => (prediction, PredictionSource::Primary),
            Err(CallError::Open { name }) => {
                tracing::warn!(
                    machine = %reading.machine_id,
                    breaker = %name,
                    "Model circuit open, using rule-based fallback",
                );
                (fallback_prediction(reading), PredictionSource::Fallback)
            }
            Err(CallError::Inner(PredictorError::Invalid(reason))) => {
                return Err(PredictionError::Rejected(reason));
            }
            Err(CallError::Inner(error)) => {
                tracing::warn!(
                    machine = %reading.machine_id,
                    error = %error,
                    "Model prediction failed, using rule-based fallback",
                );
                (fallback_prediction(reading), PredictionSource::Fallback)
            }
        };

        prediction.health_score = prediction.health_score.clamp(0.0, 100.0);
        if source == PredictionSource::Primary && quality.score < QUALITY_ATTENUATION_THRESHOLD {
            prediction.confidence *= quality.score / 100.0;
            tracing::info!(
                machine = %reading.machine_id,
                quality_score = quality.score,
                confidence = prediction.confidence,
                "Confidence attenuated for low data quality",
            );
        }

        if prediction.health_score < LOW_HEALTH_ALERT_THRESHOLD {
            tracing::warn!(
                machine = %reading.machine_id,
                health_score = prediction.health_score,
                source = source.as_str(),
                model = %prediction.model_version,
                "Low predicted machine health",
            );
        }

        let elapsed = started.elapsed();
        self.sink.record_prediction(
            &reading.machine_id,
            source.as_str(),
            prediction.health_score,
            elapsed,
        );

        Ok(PredictionOutcome {
            machine_id: reading.machine_id.clone(),
            prediction,
            source,
            quality,
            elapsed,
            timestamp: reading.timestamp,
        })
    }
}
