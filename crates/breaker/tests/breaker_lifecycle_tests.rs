//! Integration tests for the circuit breaker lifecycle: timed recovery,
//! transition reporting, and stats snapshot shape.

use std::sync::Arc;
use std::time::Duration;

use haulsense_breaker::{BreakerConfig, BreakerRegistry, BreakerState};
use haulsense_core::{Clock, ManualClock, RecordingSink, SinkEvent};

fn registry_with_clock() -> (BreakerRegistry, Arc<ManualClock>, Arc<RecordingSink>) {
    let clock = Arc::new(ManualClock::new(chrono::Utc::now()));
    let sink = Arc::new(RecordingSink::new());
    let registry = BreakerRegistry::new(
        Arc::clone(&clock) as Arc<dyn Clock>,
        Arc::clone(&sink) as _,
    );
    (registry, clock, sink)
}

// ---------------------------------------------------------------------------
// Test: full open -> half-open -> closed cycle
// ---------------------------------------------------------------------------

/// Drives a breaker through a complete failure/recovery cycle and checks the
/// state at every step, advancing time with the manual clock.
#[test]
fn full_recovery_cycle() {
    let (registry, clock, _sink) = registry_with_clock();
    let breaker = registry
        .get_or_create(
            "ml_model",
            BreakerConfig {
                failure_threshold: 2,
                open_timeout: Duration::from_secs(30),
                success_threshold: 2,
            },
        )
        .unwrap();

    // Trip the circuit.
    breaker.record_failure();
    breaker.record_failure();
    assert_eq!(breaker.stats().state, BreakerState::Open);
    assert!(!breaker.allow());

    // Cooldown elapses; the first allowed call is the probe.
    clock.advance(chrono::Duration::seconds(30));
    assert!(breaker.allow());
    assert_eq!(breaker.stats().state, BreakerState::HalfOpen);

    // Two successful probes close the circuit.
    breaker.record_success();
    breaker.record_success();
    let stats = breaker.stats();
    assert_eq!(stats.state, BreakerState::Closed);
    assert_eq!(stats.failure_count, 0);
    assert_eq!(stats.success_count, 0);
    assert_eq!(stats.opens, 1);
    assert_eq!(stats.closes, 1);
}

// ---------------------------------------------------------------------------
// Test: transitions are reported to the metrics sink
// ---------------------------------------------------------------------------

/// Every state transition lands in the sink in order:
/// closed->open, open->half_open, half_open->closed.
#[test]
fn transitions_reach_the_sink() {
    let (registry, clock, sink) = registry_with_clock();
    let breaker = registry
        .get_or_create(
            "ml_model",
            BreakerConfig {
                failure_threshold: 1,
                open_timeout: Duration::from_secs(10),
                success_threshold: 1,
            },
        )
        .unwrap();

    breaker.record_failure();
    clock.advance(chrono::Duration::seconds(10));
    assert!(breaker.allow());
    breaker.record_success();

    let transitions: Vec<SinkEvent> = sink
        .events()
        .into_iter()
        .filter(|e| matches!(e, SinkEvent::BreakerTransition { .. }))
        .collect();
    assert_eq!(transitions.len(), 3);
    assert_eq!(
        transitions[0],
        SinkEvent::BreakerTransition {
            breaker: "ml_model".to_string(),
            from: "closed".to_string(),
            to: "open".to_string(),
        }
    );
    assert_eq!(
        transitions[1],
        SinkEvent::BreakerTransition {
            breaker: "ml_model".to_string(),
            from: "open".to_string(),
            to: "half_open".to_string(),
        }
    );
    assert_eq!(
        transitions[2],
        SinkEvent::BreakerTransition {
            breaker: "ml_model".to_string(),
            from: "half_open".to_string(),
            to: "closed".to_string(),
        }
    );
}

// ---------------------------------------------------------------------------
// Test: stats snapshot serialization shape
// ---------------------------------------------------------------------------

/// `BreakerStats` serializes with snake_case state names and all counters,
/// so downstream health endpoints can expose it as-is.
#[test]
fn stats_serialize_with_expected_shape() {
    let (registry, _clock, _sink) = registry_with_clock();
    let breaker = registry.ml_model().unwrap();
    breaker.record_failure();

    let json = serde_json::to_value(breaker.stats()).expect("stats serialize");
    assert_eq!(json["name"], "ml_model");
    assert_eq!(json["state"], "closed");
    assert_eq!(json["failure_count"], 1);
    assert_eq!(json["total_failures"], 1);
    assert_eq!(json["success_rate_percent"], 0.0);
    assert!(json["last_failure_at"].is_string());
    assert!(json["last_success_at"].is_null());
}

// ---------------------------------------------------------------------------
// Test: success rate rounding
// ---------------------------------------------------------------------------

/// Success rate is a percentage rounded to two decimals.
#[tokio::test]
async fn success_rate_is_rounded() {
    let (registry, _clock, _sink) = registry_with_clock();
    let breaker = registry
        .get_or_create("external_api", BreakerConfig::external_api())
        .unwrap();

    #[derive(Debug, thiserror::Error)]
    #[error("down")]
    struct Down;

    for i in 0..3u32 {
        let result: Result<u32, _> = breaker
            .call(
                |_: &Down| true,
                || async move { if i < 2 { Ok(i) } else { Err(Down) } },
            )
            .await;
        assert_eq!(result.is_ok(), i < 2);
    }

    let stats = breaker.stats();
    assert_eq!(stats.total_requests, 3);
    assert_eq!(stats.total_successes, 2);
    // 2/3 = 66.666... -> 66.67
    assert_eq!(stats.success_rate_percent, 66.67);
}
