//! Quality monitor configuration.
//!
//! All thresholds are explicit, validated fields. The correlation rule
//! values are domain heuristics carried over from fleet operations; they are
//! configurable rather than re-derived.

use serde::Serialize;

use haulsense_core::{CoreError, Sensor};

/// Default capacity of the bounded issue log.
const DEFAULT_ISSUE_RETENTION: usize = 1000;

/// Default drift threshold in standard deviations.
const DEFAULT_DRIFT_STD_MULTIPLIER: f64 = 3.0;

// ---------------------------------------------------------------------------
// Sensor ranges
// ---------------------------------------------------------------------------

/// Inclusive physical range for one sensor.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SensorRange {
    pub min: f64,
    pub max: f64,
}

impl SensorRange {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Hard physical ranges for the sensors that have them. A value outside its
/// range cannot be a real measurement, whatever the machine's history says.
#[derive(Debug, Clone, Serialize)]
pub struct SensorRanges {
    /// °C
    pub temperature: SensorRange,
    /// g
    pub vibration: SensorRange,
    /// bar
    pub oil_pressure: SensorRange,
    /// rev/min
    pub rpm: SensorRange,
}

impl Default for SensorRanges {
    fn default() -> Self {
        Self {
            temperature: SensorRange {
                min: -50.0,
                max: 200.0,
            },
            vibration: SensorRange {
                min: 0.0,
                max: 100.0,
            },
            oil_pressure: SensorRange {
                min: 0.0,
                max: 15.0,
            },
            rpm: SensorRange {
                min: 0.0,
                max: 4000.0,
            },
        }
    }
}

impl SensorRanges {
    /// The ranged sensors in fixed evaluation order.
    pub fn iter(&self) -> [(Sensor, SensorRange); 4] {
        [
            (Sensor::Temperature, self.temperature),
            (Sensor::Vibration, self.vibration),
            (Sensor::OilPressure, self.oil_pressure),
            (Sensor::Rpm, self.rpm),
        ]
    }

    /// The hard range for `sensor`, if it has one. Fuel level has no hard
    /// range; any 0-100 gauge value is physically possible.
    pub fn get(&self, sensor: Sensor) -> Option<SensorRange> {
        match sensor {
            Sensor::Temperature => Some(self.temperature),
            Sensor::Vibration => Some(self.vibration),
            Sensor::OilPressure => Some(self.oil_pressure),
            Sensor::Rpm => Some(self.rpm),
            Sensor::FuelLevel => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Correlation rules
// ---------------------------------------------------------------------------

/// Cross-sensor plausibility thresholds.
///
/// Two rules, both pointing at a sensor that is probably lying:
/// a hard-working engine that reads cold, and a hot engine with no oil
/// pressure.
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationRules {
    /// Rule A: rpm above this...
    pub high_rpm: f64,
    /// ...with temperature below this is anomalous.
    pub cold_engine_temp: f64,
    /// Confidence attached to rule A issues.
    pub high_rpm_cold_confidence: f64,

    /// Rule B: temperature above this...
    pub hot_engine_temp: f64,
    /// ...with oil pressure below this is anomalous.
    pub low_oil_pressure: f64,
    /// Confidence attached to rule B issues.
    pub hot_low_oil_confidence: f64,
}

impl Default for CorrelationRules {
    fn default() -> Self {
        Self {
            high_rpm: 2000.0,
            cold_engine_temp: 60.0,
            high_rpm_cold_confidence: 0.6,
            hot_engine_temp: 100.0,
            low_oil_pressure: 1.0,
            hot_low_oil_confidence: 0.9,
        }
    }
}

// ---------------------------------------------------------------------------
// MonitorConfig
// ---------------------------------------------------------------------------

/// Configuration for [`DataQualityMonitor`](crate::DataQualityMonitor).
/// Immutable after construction.
#[derive(Debug, Clone, Serialize)]
pub struct MonitorConfig {
    pub sensor_ranges: SensorRanges,
    /// A reading is drift-flagged when it deviates from the profile mean by
    /// more than this many (approximate) standard deviations.
    pub drift_std_multiplier: f64,
    /// Maximum number of issues retained in the in-memory log.
    pub issue_retention: usize,
    pub correlation: CorrelationRules,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            sensor_ranges: SensorRanges::default(),
            drift_std_multiplier: DEFAULT_DRIFT_STD_MULTIPLIER,
            issue_retention: DEFAULT_ISSUE_RETENTION,
            correlation: CorrelationRules::default(),
        }
    }
}

impl MonitorConfig {
    /// Validate the configuration.
    ///
    /// Rules: every sensor range must have `min < max`, the drift multiplier
    /// must be positive, retention must be at least 1, and correlation
    /// confidences must be within `[0.0, 1.0]`.
    pub fn validate(&self) -> Result<(), CoreError> {
        for (sensor, range) in self.sensor_ranges.iter() {
            if range.min >= range.max {
                return Err(CoreError::Validation(format!(
                    "{sensor} range must have min < max, got [{}, {}]",
                    range.min, range.max
                )));
            }
        }
        if self.drift_std_multiplier <= 0.0 {
            return Err(CoreError::Validation(
                "drift_std_multiplier must be positive".to_string(),
            ));
        }
        if self.issue_retention < 1 {
            return Err(CoreError::Validation(
                "issue_retention must be at least 1".to_string(),
            ));
        }
        for confidence in [
            self.correlation.high_rpm_cold_confidence,
            self.correlation.hot_low_oil_confidence,
        ] {
            if !(0.0..=1.0).contains(&confidence) {
                return Err(CoreError::Validation(format!(
                    "correlation confidence must be between 0.0 and 1.0, got {confidence}"
                )));
            }
        }
        Ok(())
    }
}
