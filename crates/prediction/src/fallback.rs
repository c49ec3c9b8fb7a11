//! Rule-based fallback scoring.
//!
//! When the model is unreachable the fleet still needs a health number. The
//! fallback starts every machine at 100 and deducts points per worrying
//! sensor value, using thresholds maintenance crews already reason in.
//! Missing sensors deduct nothing; absence of evidence is handled by the
//! quality layer, not here.

use haulsense_core::TelemetryReading;

use crate::predictor::Prediction;

/// Model version reported by fallback predictions.
pub const FALLBACK_MODEL_VERSION: &str = "rule_based_v1";

/// Confidence of every fallback prediction, before quality attenuation.
pub const FALLBACK_CONFIDENCE: f64 = 0.6;

/// Score a reading with the fixed deduction table, clamped to `[0, 100]`.
pub fn fallback_health_score(reading: &TelemetryReading) -> f64 {
    let mut score: f64 = 100.0;

    if let Some(temp) = reading.temperature {
        if temp > 90.0 {
            score -= 20.0;
        } else if temp > 85.0 {
            score -= 10.0;
        }
    }
    if let Some(vibration) = reading.vibration {
        if vibration > 5.0 {
            score -= 25.0;
        } else if vibration > 3.0 {
            score -= 15.0;
        }
    }
    if let Some(oil) = reading.oil_pressure {
        if oil < 2.0 {
            score -= 30.0;
        } else if oil < 3.0 {
            score -= 15.0;
        }
    }
    if let Some(fuel) = reading.fuel_level {
        if fuel < 10.0 {
            score -= 20.0;
        } else if fuel < 25.0 {
            score -= 10.0;
        }
    }

    score.clamp(0.0, 100.0)
}

/// Build a complete fallback [`Prediction`] for a reading.
pub fn fallback_prediction(reading: &TelemetryReading) -> Prediction {
    Prediction {
        health_score: fallback_health_score(reading),
        confidence: FALLBACK_CONFIDENCE,
        model_version: FALLBACK_MODEL_VERSION.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading() -> TelemetryReading {
        TelemetryReading {
            machine_id: "truck-1".to_string(),
            timestamp: chrono::Utc::now(),
            temperature: Some(82.0),
            vibration: Some(1.4),
            oil_pressure: Some(3.5),
            rpm: Some(1800.0),
            fuel_level: Some(70.0),
        }
    }

    #[test]
    fn healthy_reading_scores_100() {
        assert_eq!(fallback_health_score(&reading()), 100.0);
    }

    #[test]
    fn temperature_tiers() {
        let mut r = reading();
        r.temperature = Some(87.0);
        assert_eq!(fallback_health_score(&r), 90.0);
        r.temperature = Some(95.0);
        assert_eq!(fallback_health_score(&r), 80.0);
    }

    #[test]
    fn vibration_tiers() {
        let mut r = reading();
        r.vibration = Some(4.0);
        assert_eq!(fallback_health_score(&r), 85.0);
        r.vibration = Some(6.0);
        assert_eq!(fallback_health_score(&r), 75.0);
    }

    #[test]
    fn oil_pressure_tiers() {
        let mut r = reading();
        r.oil_pressure = Some(2.5);
        assert_eq!(fallback_health_score(&r), 85.0);
        r.oil_pressure = Some(1.0);
        assert_eq!(fallback_health_score(&r), 70.0);
    }

    #[test]
    fn fuel_tiers() {
        let mut r = reading();
        r.fuel_level = Some(20.0);
        assert_eq!(fallback_health_score(&r), 90.0);
        r.fuel_level = Some(5.0);
        assert_eq!(fallback_health_score(&r), 80.0);
    }

    #[test]
    fn tier_boundaries_are_exclusive() {
        // Exactly at a threshold stays in the milder tier.
        let mut r = reading();
        r.temperature = Some(90.0);
        assert_eq!(fallback_health_score(&r), 90.0);
        r.temperature = Some(85.0);
        assert_eq!(fallback_health_score(&r), 100.0);

        let mut r = reading();
        r.oil_pressure = Some(2.0);
        assert_eq!(fallback_health_score(&r), 85.0);
        r.oil_pressure = Some(3.0);
        assert_eq!(fallback_health_score(&r), 100.0);
    }

    #[test]
    fn deductions_stack() {
        let mut r = reading();
        r.temperature = Some(95.0); // -20
        r.vibration = Some(6.0); // -25
        r.oil_pressure = Some(1.0); // -30
        r.fuel_level = Some(5.0); // -20
        assert_eq!(fallback_health_score(&r), 5.0);
    }

    #[test]
    fn missing_sensors_deduct_nothing() {
        let mut r = reading();
        r.temperature = None;
        r.vibration = None;
        r.oil_pressure = None;
        r.fuel_level = None;
        assert_eq!(fallback_health_score(&r), 100.0);
    }

    #[test]
    fn fallback_prediction_is_labeled() {
        let p = fallback_prediction(&reading());
        assert_eq!(p.model_version, "rule_based_v1");
        assert_eq!(p.confidence, 0.6);
        assert_eq!(p.health_score, 100.0);
    }
}
