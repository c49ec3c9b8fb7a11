//! Quality issues, severities, and the per-reading report.

use serde::Serialize;

use haulsense_core::{Sensor, Timestamp};

/// Score deduction for a Critical issue.
const DEDUCTION_CRITICAL: f64 = 25.0;
/// Score deduction for a High issue.
const DEDUCTION_HIGH: f64 = 15.0;
/// Score deduction for a Medium issue.
const DEDUCTION_MEDIUM: f64 = 10.0;
/// Score deduction for a Warning issue.
const DEDUCTION_WARNING: f64 = 5.0;

// ---------------------------------------------------------------------------
// IssueKind / Severity
// ---------------------------------------------------------------------------

/// What kind of problem was detected in a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// A value outside the sensor's hard physical range.
    ImpossibleValue,
    /// A value far from the machine's own statistical baseline.
    StatisticalDrift,
    /// A critical sensor reported `null` or exactly zero.
    MissingSensor,
    /// Two sensors that should move together disagree.
    CorrelationAnomaly,
}

impl IssueKind {
    /// Canonical string name, used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::ImpossibleValue => "impossible_value",
            IssueKind::StatisticalDrift => "statistical_drift",
            IssueKind::MissingSensor => "missing_sensor",
            IssueKind::CorrelationAnomaly => "correlation_anomaly",
        }
    }
}

/// How much an issue degrades trust in the reading.
///
/// Ordered least to most severe so `Ord` can drive most-severe-first sorts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Canonical string name, used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    /// How many points this severity removes from a reading's score.
    pub fn deduction(&self) -> f64 {
        match self {
            Severity::Critical => DEDUCTION_CRITICAL,
            Severity::High => DEDUCTION_HIGH,
            Severity::Medium => DEDUCTION_MEDIUM,
            Severity::Warning => DEDUCTION_WARNING,
        }
    }
}

// ---------------------------------------------------------------------------
// QualityIssue
// ---------------------------------------------------------------------------

/// One detected problem with one reading. Transient: issues live inside a
/// [`QualityReport`] and the monitor's bounded log, never in storage.
#[derive(Debug, Clone, Serialize)]
pub struct QualityIssue {
    pub machine_id: String,
    pub kind: IssueKind,
    /// The sensor the issue points at, when a single sensor is implicated.
    pub sensor: Option<Sensor>,
    pub severity: Severity,
    pub description: String,
    /// The offending value. `None` when a sensor reported nothing at all.
    pub observed_value: Option<f64>,
    /// `(lo, hi)` range the value was expected to fall in.
    pub expected_range: (f64, f64),
    pub timestamp: Timestamp,
    /// How confident the detector is that this is a real problem (0-1).
    pub confidence: f64,
}

// ---------------------------------------------------------------------------
// QualityLevel / QualityReport
// ---------------------------------------------------------------------------

/// Banded interpretation of a quality score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityLevel {
    Excellent,
    Good,
    Fair,
    Poor,
    Critical,
}

impl QualityLevel {
    /// Band a 0-100 score: >=90 Excellent, >=80 Good, >=70 Fair, >=60 Poor,
    /// otherwise Critical.
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            QualityLevel::Excellent
        } else if score >= 80.0 {
            QualityLevel::Good
        } else if score >= 70.0 {
            QualityLevel::Fair
        } else if score >= 60.0 {
            QualityLevel::Poor
        } else {
            QualityLevel::Critical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityLevel::Excellent => "excellent",
            QualityLevel::Good => "good",
            QualityLevel::Fair => "fair",
            QualityLevel::Poor => "poor",
            QualityLevel::Critical => "critical",
        }
    }
}

/// The quality verdict for one reading.
#[derive(Debug, Clone, Serialize)]
pub struct QualityReport {
    pub machine_id: String,
    /// 0-100; starts at 100 and loses points per issue severity.
    pub score: f64,
    pub level: QualityLevel,
    pub issues: Vec<QualityIssue>,
    /// `true` iff no issues were found.
    pub is_healthy: bool,
    pub timestamp: Timestamp,
}

impl QualityReport {
    /// Build a report from detected issues, computing score and level.
    pub fn from_issues(
        machine_id: String,
        issues: Vec<QualityIssue>,
        timestamp: Timestamp,
    ) -> Self {
        let score = score_for(&issues);
        Self {
            machine_id,
            score,
            level: QualityLevel::from_score(score),
            is_healthy: issues.is_empty(),
            issues,
            timestamp,
        }
    }
}

/// Score a set of issues: start at 100, subtract per severity, clamp to
/// `[0, 100]`.
pub fn score_for(issues: &[QualityIssue]) -> f64 {
    let deductions: f64 = issues.iter().map(|i| i.severity.deduction()).sum();
    (100.0 - deductions).clamp(0.0, 100.0)
}
