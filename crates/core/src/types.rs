//! Telemetry reading and sensor types shared across the workspace.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Maximum length of a machine identifier.
const MAX_MACHINE_ID_LEN: usize = 128;

// ---------------------------------------------------------------------------
// Sensor
// ---------------------------------------------------------------------------

/// The sensors a fleet machine reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sensor {
    Temperature,
    Vibration,
    OilPressure,
    Rpm,
    FuelLevel,
}

impl Sensor {
    /// All known sensors, in reporting order.
    pub const ALL: [Sensor; 5] = [
        Sensor::Temperature,
        Sensor::Vibration,
        Sensor::OilPressure,
        Sensor::Rpm,
        Sensor::FuelLevel,
    ];

    /// Sensors for which a `null` or exactly-zero reading indicates a sensor
    /// failure rather than a legitimate physical value.
    pub const CRITICAL: [Sensor; 4] = [
        Sensor::Temperature,
        Sensor::Vibration,
        Sensor::OilPressure,
        Sensor::Rpm,
    ];

    /// Canonical string name, used in logs, metrics, and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Sensor::Temperature => "temperature",
            Sensor::Vibration => "vibration",
            Sensor::OilPressure => "oil_pressure",
            Sensor::Rpm => "rpm",
            Sensor::FuelLevel => "fuel_level",
        }
    }

    /// Unit suffix for human-readable messages.
    pub fn unit(&self) -> &'static str {
        match self {
            Sensor::Temperature => "°C",
            Sensor::Vibration => "g",
            Sensor::OilPressure => "bar",
            Sensor::Rpm => "rpm",
            Sensor::FuelLevel => "%",
        }
    }
}

impl std::fmt::Display for Sensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// TelemetryReading
// ---------------------------------------------------------------------------

/// One raw telemetry reading from a machine.
///
/// Individual sensors may be absent (`None`) when the machine did not report
/// them; the quality monitor treats missing critical sensors as an issue
/// rather than an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryReading {
    pub machine_id: String,
    pub timestamp: Timestamp,
    /// Engine temperature in °C.
    pub temperature: Option<f64>,
    /// Vibration in g.
    pub vibration: Option<f64>,
    /// Oil pressure in bar.
    pub oil_pressure: Option<f64>,
    /// Engine speed in revolutions per minute.
    pub rpm: Option<f64>,
    /// Fuel level as a percentage (0-100).
    pub fuel_level: Option<f64>,
}

impl TelemetryReading {
    /// The reported value for `sensor`, if present.
    pub fn sensor_value(&self, sensor: Sensor) -> Option<f64> {
        match sensor {
            Sensor::Temperature => self.temperature,
            Sensor::Vibration => self.vibration,
            Sensor::OilPressure => self.oil_pressure,
            Sensor::Rpm => self.rpm,
            Sensor::FuelLevel => self.fuel_level,
        }
    }

    /// Validate that the reading is well-formed.
    ///
    /// Rules:
    /// - `machine_id` must be non-empty, at most 128 characters, and contain
    ///   only alphanumeric, hyphen, underscore, or dot characters.
    /// - Every present sensor value must be finite (no NaN or infinities).
    ///
    /// A reading that fails validation is a caller error and must not enter
    /// the quality/prediction pipeline.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.machine_id.is_empty() {
            return Err(CoreError::Validation(
                "Machine id must not be empty".to_string(),
            ));
        }
        if self.machine_id.len() > MAX_MACHINE_ID_LEN {
            return Err(CoreError::Validation(format!(
                "Machine id must not exceed {MAX_MACHINE_ID_LEN} characters"
            )));
        }
        if !self
            .machine_id
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
        {
            return Err(CoreError::Validation(
                "Machine id may only contain alphanumeric, hyphen, underscore, or dot characters"
                    .to_string(),
            ));
        }
        for sensor in Sensor::ALL {
            if let Some(value) = self.sensor_value(sensor) {
                if !value.is_finite() {
                    return Err(CoreError::Validation(format!(
                        "{sensor} value must be finite, got {value}"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(machine_id: &str) -> TelemetryReading {
        TelemetryReading {
            machine_id: machine_id.to_string(),
            timestamp: chrono::Utc::now(),
            temperature: Some(82.0),
            vibration: Some(1.4),
            oil_pressure: Some(3.5),
            rpm: Some(1800.0),
            fuel_level: Some(70.0),
        }
    }

    // -- validate -------------------------------------------------------------

    #[test]
    fn valid_reading_accepted() {
        assert!(reading("truck-042").validate().is_ok());
    }

    #[test]
    fn empty_machine_id_rejected() {
        assert!(reading("").validate().is_err());
    }

    #[test]
    fn overlong_machine_id_rejected() {
        assert!(reading(&"x".repeat(129)).validate().is_err());
    }

    #[test]
    fn unsafe_machine_id_rejected() {
        assert!(reading("truck 042").validate().is_err());
        assert!(reading("truck;rm").validate().is_err());
    }

    #[test]
    fn non_finite_sensor_rejected() {
        let mut r = reading("truck-042");
        r.vibration = Some(f64::NAN);
        assert!(r.validate().is_err());

        let mut r = reading("truck-042");
        r.temperature = Some(f64::INFINITY);
        assert!(r.validate().is_err());
    }

    #[test]
    fn absent_sensors_are_valid() {
        let mut r = reading("truck-042");
        r.temperature = None;
        r.rpm = None;
        assert!(r.validate().is_ok());
    }

    // -- sensor_value ---------------------------------------------------------

    #[test]
    fn sensor_value_maps_fields() {
        let r = reading("truck-042");
        assert_eq!(r.sensor_value(Sensor::Temperature), Some(82.0));
        assert_eq!(r.sensor_value(Sensor::OilPressure), Some(3.5));
        assert_eq!(r.sensor_value(Sensor::FuelLevel), Some(70.0));
    }

    #[test]
    fn sensor_names_are_snake_case() {
        assert_eq!(Sensor::OilPressure.as_str(), "oil_pressure");
        assert_eq!(Sensor::FuelLevel.as_str(), "fuel_level");
    }

    // -- serialization --------------------------------------------------------

    #[test]
    fn reading_serializes_with_expected_shape() {
        let mut r = reading("truck-042");
        r.rpm = None;

        let json = serde_json::to_value(&r).expect("reading serializes");
        assert_eq!(json["machine_id"], "truck-042");
        assert_eq!(json["temperature"], 82.0);
        assert_eq!(json["oil_pressure"], 3.5);
        assert!(json["rpm"].is_null());
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn reading_round_trips_through_json() {
        let r = reading("truck-042");
        let json = serde_json::to_string(&r).expect("serializes");
        let back: TelemetryReading = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(back.machine_id, r.machine_id);
        assert_eq!(back.sensor_value(Sensor::Vibration), Some(1.4));
    }
}
