//! Per-machine running statistical profiles.
//!
//! Profiles are built online from every reading; no raw history is kept.
//! The standard deviation is an exponentially weighted deviation rather
//! than a true population std: `0.1 * |value - old_mean| + 0.9 * old_std`.
//! That is intentional — machine baselines drift with wear, so the profile
//! should favor recent behavior over statistical exactness.

use std::collections::HashMap;

use serde::Serialize;

use haulsense_core::{Sensor, Timestamp};

/// Weight of the newest deviation in the running std update.
const STD_RECENT_WEIGHT: f64 = 0.1;

// ---------------------------------------------------------------------------
// SensorStats
// ---------------------------------------------------------------------------

/// Running statistics for one sensor on one machine.
#[derive(Debug, Clone, Serialize)]
pub struct SensorStats {
    pub count: u64,
    pub mean: f64,
    /// Exponentially weighted deviation; approximate by design.
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

impl SensorStats {
    /// Initialize from the first-ever sample.
    pub fn first(value: f64) -> Self {
        Self {
            count: 1,
            mean: value,
            std: 0.0,
            min: value,
            max: value,
        }
    }

    /// Fold one new sample into the running statistics.
    pub fn observe(&mut self, value: f64) {
        let old_mean = self.mean;
        self.count += 1;
        self.mean = (old_mean * (self.count - 1) as f64 + value) / self.count as f64;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.std =
            STD_RECENT_WEIGHT * (value - old_mean).abs() + (1.0 - STD_RECENT_WEIGHT) * self.std;
    }
}

// ---------------------------------------------------------------------------
// MachineProfile
// ---------------------------------------------------------------------------

/// Everything the monitor knows about one machine's normal behavior.
///
/// Created lazily on the machine's first reading and never deleted; old
/// behavior fades out implicitly through the exponential weighting.
#[derive(Debug, Clone, Serialize)]
pub struct MachineProfile {
    pub machine_id: String,
    /// Stats per sensor; an entry exists only once the sensor has been
    /// observed at least once.
    pub sensors: HashMap<Sensor, SensorStats>,
    /// Total readings folded into this profile.
    pub sample_count: u64,
    pub last_updated: Timestamp,
}

impl MachineProfile {
    pub fn new(machine_id: String, now: Timestamp) -> Self {
        Self {
            machine_id,
            sensors: HashMap::new(),
            sample_count: 0,
            last_updated: now,
        }
    }

    /// Fold every present sensor value of a reading into the profile.
    pub fn update(&mut self, values: &[(Sensor, f64)], now: Timestamp) {
        self.sample_count += 1;
        self.last_updated = now;
        for &(sensor, value) in values {
            match self.sensors.get_mut(&sensor) {
                Some(stats) => stats.observe(value),
                None => {
                    self.sensors.insert(sensor, SensorStats::first(value));
                }
            }
        }
    }

    /// The running stats for `sensor`, if it has ever been observed.
    pub fn stats(&self, sensor: Sensor) -> Option<&SensorStats> {
        self.sensors.get(&sensor)
    }
}
