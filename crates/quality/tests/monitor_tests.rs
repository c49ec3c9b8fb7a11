//! End-to-end quality monitor scenarios through the public API.

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;

use haulsense_core::{Clock, ManualClock, NullSink, TelemetryReading};
use haulsense_quality::{
    DataQualityMonitor, IssueKind, MonitorConfig, QualityLevel, Severity,
};

fn monitor() -> DataQualityMonitor {
    DataQualityMonitor::new(
        MonitorConfig::default(),
        Arc::new(haulsense_core::SystemClock),
        Arc::new(NullSink),
    )
    .expect("valid config")
}

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

// ---------------------------------------------------------------------------
// Drift over a realistic noisy baseline
// ---------------------------------------------------------------------------

#[test]
fn noisy_baseline_flags_the_outlier_but_not_the_noise() {
    let m = monitor();

    // A week of normal operation: temperature wobbling around 80°C. The
    // first few wobbles may themselves be flagged while the running std
    // bootstraps; only the settled baseline matters here.
    for i in 0..50 {
        let mut r = reading("truck-1");
        r.temperature = Some(if i % 2 == 0 { 79.0 } else { 81.0 });
        m.check(&r);
    }

    // An ordinary wobble against the settled baseline is fine.
    let mut r = reading("truck-1");
    r.temperature = Some(80.5);
    assert!(m.check(&r).is_healthy);

    // A 15-degree jump against that tight baseline is drift.
    let mut r = reading("truck-1");
    r.temperature = Some(95.0);
    let report = m.check(&r);
    let issue = report
        .issues
        .iter()
        .find(|i| i.kind == IssueKind::StatisticalDrift)
        .expect("outlier should be flagged as drift");
    assert_eq!(issue.severity, Severity::Warning);
    assert_eq!(report.level, QualityLevel::Excellent); // one warning: 95
}

// ---------------------------------------------------------------------------
// Fleet report
// ---------------------------------------------------------------------------

#[test]
fn empty_fleet_reports_perfect_score() {
    let report = monitor().fleet_report();
    assert_eq!(report.overall_score, 100.0);
    assert_eq!(report.level, QualityLevel::Excellent);
    assert_eq!(report.total_machines, 0);
    assert!(report.recent_issues.is_empty());
}

#[test]
fn fleet_report_aggregates_across_machines() {
    let m = monitor();

    m.check(&reading("truck-1"));
    let mut bad = reading("truck-2");
    bad.temperature = Some(250.0);
    m.check(&bad);

    let report = m.fleet_report();
    assert_eq!(report.total_machines, 2);
    assert_eq!(report.machines_with_issues, 1);
    assert_eq!(report.total_issues, 1);
    // 100 - (1 issue / 2 machines) * 10
    assert_eq!(report.overall_score, 95.0);
    assert_eq!(report.level, QualityLevel::Excellent);
    assert_eq!(report.total_checks, 2);
    assert_eq!(report.issues_detected, 1);
}

#[test]
fn recent_issues_are_most_severe_first() {
    let m = monitor();

    // Warning-severity drift on truck-1.
    for i in 0..30 {
        let mut r = reading("truck-1");
        r.temperature = Some(if i % 2 == 0 { 79.0 } else { 81.0 });
        m.check(&r);
    }
    let mut drifted = reading("truck-1");
    drifted.temperature = Some(95.0);
    m.check(&drifted);

    // Critical impossible value on truck-2, after the warning.
    let mut impossible = reading("truck-2");
    impossible.temperature = Some(250.0);
    m.check(&impossible);

    let report = m.fleet_report();
    assert!(report.recent_issues.len() >= 2);
    assert_eq!(report.recent_issues[0].severity, Severity::Critical);
    assert_matches!(
        report.recent_issues[0].kind,
        IssueKind::ImpossibleValue | IssueKind::MissingSensor
    );
    let severities: Vec<_> = report.recent_issues.iter().map(|i| i.severity).collect();
    let mut sorted = severities.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(severities, sorted);
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

#[test]
fn history_filters_by_machine_and_window() {
    let clock = Arc::new(ManualClock::new(chrono::Utc::now()));
    let m = DataQualityMonitor::new(
        MonitorConfig::default(),
        Arc::clone(&clock) as Arc<dyn Clock>,
        Arc::new(NullSink),
    )
    .unwrap();

    let mut old_issue = reading("truck-1");
    old_issue.temperature = Some(250.0);
    m.check(&old_issue);

    clock.advance(chrono::Duration::hours(10));

    let mut fresh_issue = reading("truck-1");
    fresh_issue.oil_pressure = Some(0.0);
    m.check(&fresh_issue);

    let mut other_machine = reading("truck-2");
    other_machine.temperature = Some(250.0);
    m.check(&other_machine);

    let recent = m.history("truck-1", Duration::from_secs(3600));
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].kind, IssueKind::MissingSensor);

    let all = m.history("truck-1", Duration::from_secs(24 * 3600));
    assert_eq!(all.len(), 2);

    assert!(m.history("truck-3", Duration::from_secs(24 * 3600)).is_empty());
}

// ---------------------------------------------------------------------------
// Report serialization
// ---------------------------------------------------------------------------

#[test]
fn quality_report_serializes_with_expected_shape() {
    let m = monitor();
    let mut r = reading("truck-1");
    r.temperature = Some(250.0);

    let json = serde_json::to_value(m.check(&r)).expect("report serializes");
    assert_eq!(json["machine_id"], "truck-1");
    assert_eq!(json["score"], 75.0);
    assert_eq!(json["level"], "fair");
    assert_eq!(json["is_healthy"], false);

    let issue = &json["issues"][0];
    assert_eq!(issue["kind"], "impossible_value");
    assert_eq!(issue["severity"], "critical");
    assert_eq!(issue["sensor"], "temperature");
    assert_eq!(issue["observed_value"], 250.0);
}
