//! The data quality monitor.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use serde::Serialize;

use haulsense_core::{
    Clock, CoreError, MetricsSink, Sensor, SystemClock, TelemetryReading, Timestamp, TracingSink,
};

use crate::config::MonitorConfig;
use crate::issue::{IssueKind, QualityIssue, QualityLevel, QualityReport, Severity};
use crate::profile::MachineProfile;

/// Confidence attached to statistical drift issues. Drift against an
/// approximate std is a strong hint, not proof.
const DRIFT_CONFIDENCE: f64 = 0.8;

/// Placeholder expected range for missing-sensor issues; a critical sensor
/// should report something strictly positive.
const MISSING_EXPECTED_RANGE: (f64, f64) = (0.1, 1000.0);

/// How many issues a fleet report includes, most severe first.
const RECENT_ISSUES_LIMIT: usize = 20;

// ---------------------------------------------------------------------------
// FleetQualityReport
// ---------------------------------------------------------------------------

/// Fleet-wide quality summary across every monitored machine.
#[derive(Debug, Clone, Serialize)]
pub struct FleetQualityReport {
    /// `100 - (retained issues per machine * 10)`, clamped to `[0, 100]`.
    pub overall_score: f64,
    pub level: QualityLevel,
    pub total_machines: usize,
    /// Machines with at least one issue still in the retained log.
    pub machines_with_issues: usize,
    /// Issues currently retained in the log.
    pub total_issues: usize,
    /// Retained issues, most severe first, newest first within a severity.
    pub recent_issues: Vec<QualityIssue>,
    /// Readings checked over the monitor's lifetime.
    pub total_checks: u64,
    /// Issues detected over the monitor's lifetime.
    pub issues_detected: u64,
    pub timestamp: Timestamp,
}

// ---------------------------------------------------------------------------
// DataQualityMonitor
// ---------------------------------------------------------------------------

/// Scores readings and maintains per-machine statistical profiles.
///
/// Safe under concurrent calls for different and the same machine. The
/// profile map lock is held only to look up or insert a profile `Arc`;
/// per-machine locks are held only around one profile's read or
/// read-modify-write, never across the whole check. The issue log is a
/// separate bounded structure with its own lock.
pub struct DataQualityMonitor {
    config: MonitorConfig,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn MetricsSink>,
    profiles: RwLock<HashMap<String, Arc<Mutex<MachineProfile>>>>,
    issue_log: Mutex<VecDeque<QualityIssue>>,
    total_checks: AtomicU64,
    issues_detected: AtomicU64,
}

impl Default for DataQualityMonitor {
    fn default() -> Self {
        Self {
            config: MonitorConfig::default(),
            clock: Arc::new(SystemClock),
            sink: Arc::new(TracingSink),
            profiles: RwLock::new(HashMap::new()),
            issue_log: Mutex::new(VecDeque::new()),
            total_checks: AtomicU64::new(0),
            issues_detected: AtomicU64::new(0),
        }
    }
}

impl DataQualityMonitor {
    /// Create a monitor with the given configuration, clock, and sink.
    ///
    /// Fails with `CoreError::Validation` if the config is invalid.
    pub fn new(
        config: MonitorConfig,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn MetricsSink>,
    ) -> Result<Self, CoreError> {
        config.validate()?;
        Ok(Self {
            config,
            clock,
            sink,
            profiles: RwLock::new(HashMap::new()),
            issue_log: Mutex::new(VecDeque::new()),
            total_checks: AtomicU64::new(0),
            issues_detected: AtomicU64::new(0),
        })
    }

    /// Evaluate one reading, returning its quality report and folding the
    /// reading into the machine's profile.
    ///
    /// The checks run in a fixed order and accumulate (they are not mutually
    /// exclusive): impossible values, statistical drift against the profile,
    /// missing/zero critical sensors, cross-sensor correlation rules. The
    /// profile is updated last, whatever issues were found, so bad readings
    /// still shape the baseline. Expects a validated reading.
    pub fn check(&self, reading: &TelemetryReading) -> QualityReport {
        let now = self.clock.now();
        self.total_checks.fetch_add(1, Ordering::Relaxed);

        let mut issues = Vec::new();
        self.check_impossible_values(reading, now, &mut issues);
        self.check_drift(reading, now, &mut issues);
        self.check_missing_sensors(reading, now, &mut issues);
        self.check_correlations(reading, now, &mut issues);

        if !issues.is_empty() {
            self.record_issues(&issues);
        }

        self.update_profile(reading, now);

        let report = QualityReport::from_issues(reading.machine_id.clone(), issues, now);
        tracing::debug!(
            machine = %report.machine_id,
            score = report.score,
            level = report.level.as_str(),
            issues = report.issues.len(),
            "Quality check completed",
        );
        report
    }

    /// Fleet-wide summary across all monitored machines.
    pub fn fleet_report(&self) -> FleetQualityReport {
        let total_machines = self.profiles.read().expect("profile map poisoned").len();
        let log = self.issue_log.lock().expect("issue log poisoned");

        let total_issues = log.len();
        let machines_with_issues = log
            .iter()
            .map(|i| i.machine_id.as_str())
            .collect::<HashSet<_>>()
            .len();

        let mut recent_issues: Vec<QualityIssue> = log.iter().cloned().collect();
        drop(log);
        recent_issues.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then(b.timestamp.cmp(&a.timestamp))
        });
        recent_issues.truncate(RECENT_ISSUES_LIMIT);

        let overall_score = if total_machines > 0 {
            let raw = 100.0 - (total_issues as f64 / total_machines as f64) * 10.0;
            (raw.clamp(0.0, 100.0) * 100.0).round() / 100.0
        } else {
            100.0
        };

        FleetQualityReport {
            overall_score,
            level: QualityLevel::from_score(overall_score),
            total_machines,
            machines_with_issues,
            total_issues,
            recent_issues,
            total_checks: self.total_checks.load(Ordering::Relaxed),
            issues_detected: self.issues_detected.load(Ordering::Relaxed),
            timestamp: self.clock.now(),
        }
    }

    /// Retained issues for one machine within the trailing `window`.
    pub fn history(&self, machine_id: &str, window: Duration) -> Vec<QualityIssue> {
        let cutoff = self.cutoff(window);
        self.issue_log
            .lock()
            .expect("issue log poisoned")
            .iter()
            .filter(|i| i.machine_id == machine_id && i.timestamp >= cutoff)
            .cloned()
            .collect()
    }

    /// Snapshot of a machine's statistical profile, if one exists yet.
    pub fn profile(&self, machine_id: &str) -> Option<MachineProfile> {
        let profiles = self.profiles.read().expect("profile map poisoned");
        let profile = profiles.get(machine_id)?;
        let snapshot = profile.lock().expect("profile poisoned").clone();
        Some(snapshot)
    }

    /// Drop retained issues older than `max_age` to bound memory. Profiles
    /// are never pruned.
    pub fn prune(&self, max_age: Duration) {
        let cutoff = self.cutoff(max_age);
        let mut log = self.issue_log.lock().expect("issue log poisoned");
        let before = log.len();
        log.retain(|i| i.timestamp >= cutoff);
        let dropped = before - log.len();
        if dropped > 0 {
            tracing::debug!(dropped, retained = log.len(), "Pruned old quality issues");
        }
    }

    // -- detectors ------------------------------------------------------------

    /// Step 1: values outside hard physical ranges.
    fn check_impossible_values(
        &self,
        reading: &TelemetryReading,
        now: Timestamp,
        issues: &mut Vec<QualityIssue>,
    ) {
        for (sensor, range) in self.config.sensor_ranges.iter() {
            let Some(value) = reading.sensor_value(sensor) else {
                continue;
            };
            if !range.contains(value) {
                issues.push(QualityIssue {
                    machine_id: reading.machine_id.clone(),
                    kind: IssueKind::ImpossibleValue,
                    sensor: Some(sensor),
                    severity: Severity::Critical,
                    description: format!(
                        "{sensor} {value}{} is outside the physically possible range",
                        sensor.unit(),
                    ),
                    observed_value: Some(value),
                    expected_range: (range.min, range.max),
                    timestamp: now,
                    confidence: 1.0,
                });
            }
        }
    }

    /// Step 2: deviation from the machine's own baseline. Skipped for a
    /// sensor until its approximate std is nonzero, to avoid flagging the
    /// second-ever sample.
    fn check_drift(
        &self,
        reading: &TelemetryReading,
        now: Timestamp,
        issues: &mut Vec<QualityIssue>,
    ) {
        let profile = {
            let profiles = self.profiles.read().expect("profile map poisoned");
            match profiles.get(&reading.machine_id) {
                Some(p) => Arc::clone(p),
                None => return,
            }
        };

        // Snapshot (mean, std) per sensor so the profile lock is not held
        // while building issues.
        let baselines: Vec<(Sensor, f64, f64, f64)> = {
            let profile = profile.lock().expect("profile poisoned");
            Sensor::ALL
                .iter()
                .filter_map(|&sensor| {
                    let value = reading.sensor_value(sensor)?;
                    let stats = profile.stats(sensor)?;
                    Some((sensor, value, stats.mean, stats.std))
                })
                .collect()
        };

        let multiplier = self.config.drift_std_multiplier;
        for (sensor, value, mean, std) in baselines {
            if std <= 0.0 {
                continue;
            }
            if (value - mean).abs() > multiplier * std {
                issues.push(QualityIssue {
                    machine_id: reading.machine_id.clone(),
                    kind: IssueKind::StatisticalDrift,
                    sensor: Some(sensor),
                    severity: Severity::Warning,
                    description: format!(
                        "{sensor} {value}{} deviates significantly from historical mean {mean:.1}{}",
                        sensor.unit(),
                        sensor.unit(),
                    ),
                    observed_value: Some(value),
                    expected_range: (mean - multiplier * std, mean + multiplier * std),
                    timestamp: now,
                    confidence: DRIFT_CONFIDENCE,
                });
            }
        }
    }

    /// Step 3: critical sensors reporting nothing, or exactly zero — zero is
    /// never a legitimate physical reading for these sensors.
    fn check_missing_sensors(
        &self,
        reading: &TelemetryReading,
        now: Timestamp,
        issues: &mut Vec<QualityIssue>,
    ) {
        for sensor in Sensor::CRITICAL {
            let value = reading.sensor_value(sensor);
            if value.is_none() || value == Some(0.0) {
                issues.push(QualityIssue {
                    machine_id: reading.machine_id.clone(),
                    kind: IssueKind::MissingSensor,
                    sensor: Some(sensor),
                    severity: Severity::High,
                    description: format!("{sensor} sensor data is missing or zero"),
                    observed_value: value,
                    expected_range: MISSING_EXPECTED_RANGE,
                    timestamp: now,
                    confidence: 1.0,
                });
            }
        }
    }

    /// Step 4: cross-sensor plausibility rules.
    fn check_correlations(
        &self,
        reading: &TelemetryReading,
        now: Timestamp,
        issues: &mut Vec<QualityIssue>,
    ) {
        let rules = &self.config.correlation;
        let ranges = &self.config.sensor_ranges;

        // Rule A: a hard-working engine that reads cold points at a lying
        // temperature sensor.
        if let (Some(rpm), Some(temp)) = (reading.rpm, reading.temperature) {
            if rpm > rules.high_rpm && temp < rules.cold_engine_temp {
                issues.push(QualityIssue {
                    machine_id: reading.machine_id.clone(),
                    kind: IssueKind::CorrelationAnomaly,
                    sensor: Some(Sensor::Temperature),
                    severity: Severity::Medium,
                    description: format!(
                        "High RPM ({rpm}) with low temperature ({temp}°C), possible sensor issue",
                    ),
                    observed_value: Some(temp),
                    expected_range: (rules.cold_engine_temp, ranges.temperature.max),
                    timestamp: now,
                    confidence: rules.high_rpm_cold_confidence,
                });
            }
        }

        // Rule B: a hot engine with almost no oil pressure.
        if let (Some(temp), Some(oil)) = (reading.temperature, reading.oil_pressure) {
            if temp > rules.hot_engine_temp && oil < rules.low_oil_pressure {
                issues.push(QualityIssue {
                    machine_id: reading.machine_id.clone(),
                    kind: IssueKind::CorrelationAnomaly,
                    sensor: Some(Sensor::OilPressure),
                    severity: Severity::High,
                    description: format!(
                        "High temperature ({temp}°C) with very low oil pressure ({oil}bar)",
                    ),
                    observed_value: Some(oil),
                    expected_range: (rules.low_oil_pressure, ranges.oil_pressure.max),
                    timestamp: now,
                    confidence: rules.hot_low_oil_confidence,
                });
            }
        }
    }

    // -- bookkeeping ----------------------------------------------------------

    /// Step 5: fold the reading into the machine's profile.
    fn update_profile(&self, reading: &TelemetryReading, now: Timestamp) {
        let values: Vec<(Sensor, f64)> = Sensor::ALL
            .iter()
            .filter_map(|&s| reading.sensor_value(s).map(|v| (s, v)))
            .collect();

        let profile = {
            let profiles = self.profiles.read().expect("profile map poisoned");
            profiles.get(&reading.machine_id).map(Arc::clone)
        };
        let profile = match profile {
            Some(p) => p,
            None => {
                let mut profiles = self.profiles.write().expect("profile map poisoned");
                Arc::clone(profiles.entry(reading.machine_id.clone()).or_insert_with(|| {
                    Arc::new(Mutex::new(MachineProfile::new(
                        reading.machine_id.clone(),
                        now,
                    )))
                }))
            }
        };

        profile.lock().expect("profile poisoned").update(&values, now);
    }

    /// Append to the bounded log and report each issue to the sink.
    fn record_issues(&self, issues: &[QualityIssue]) {
        self.issues_detected
            .fetch_add(issues.len() as u64, Ordering::Relaxed);

        for issue in issues {
            self.sink.record_quality_issue(
                &issue.machine_id,
                issue.kind.as_str(),
                issue.severity.as_str(),
            );
        }

        let mut log = self.issue_log.lock().expect("issue log poisoned");
        for issue in issues {
            log.push_back(issue.clone());
        }
        while log.len() > self.config.issue_retention {
            log.pop_front();
        }
    }

    fn cutoff(&self, window: Duration) -> Timestamp {
        let window =
            chrono::Duration::from_std(window).unwrap_or(chrono::Duration::MAX);
        self.clock.now() - window
    }
}
