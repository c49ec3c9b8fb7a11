//! Circuit breaker state machine and call wrapper.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;

use haulsense_core::{Clock, CoreError, MetricsSink, Timestamp};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Circuit breaker thresholds. Immutable after construction.
#[derive(Debug, Clone, Serialize)]
pub struct BreakerConfig {
    /// Consecutive failures in Closed before the circuit opens.
    pub failure_threshold: u32,
    /// How long the circuit stays Open before a probe is allowed.
    pub open_timeout: Duration,
    /// Consecutive successes in HalfOpen before the circuit closes.
    pub success_threshold: u32,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_timeout: Duration::from_secs(60),
            success_threshold: 3,
        }
    }
}

impl BreakerConfig {
    /// Deployment preset for the ML model dependency: trips fast, recovers
    /// fast (3 failures / 30 s cooldown / 2 probe successes).
    pub fn ml_model() -> Self {
        Self {
            failure_threshold: 3,
            open_timeout: Duration::from_secs(30),
            success_threshold: 2,
        }
    }

    /// Deployment preset for the database dependency (5 / 60 s / 3).
    pub fn database() -> Self {
        Self::default()
    }

    /// Deployment preset for external APIs: slow to retry because external
    /// outages tend to last (3 / 120 s / 2).
    pub fn external_api() -> Self {
        Self {
            failure_threshold: 3,
            open_timeout: Duration::from_secs(120),
            success_threshold: 2,
        }
    }

    /// Validate the thresholds.
    ///
    /// Rules: both thresholds must be at least 1 and the open timeout must be
    /// strictly positive.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.failure_threshold < 1 {
            return Err(CoreError::Validation(
                "failure_threshold must be at least 1".to_string(),
            ));
        }
        if self.success_threshold < 1 {
            return Err(CoreError::Validation(
                "success_threshold must be at least 1".to_string(),
            ));
        }
        if self.open_timeout.is_zero() {
            return Err(CoreError::Validation(
                "open_timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// The three breaker states. The machine is cyclic by design; there is no
/// terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakerState {
    /// Normal operation.
    Closed,
    /// Failing fast; the dependency is not called.
    Open,
    /// Testing whether the dependency has recovered.
    HalfOpen,
}

impl BreakerState {
    /// Canonical string name, used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            BreakerState::Closed => "closed",
            BreakerState::Open => "open",
            BreakerState::HalfOpen => "half_open",
        }
    }
}

impl std::fmt::Display for BreakerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error returned by [`CircuitBreaker::call`].
#[derive(Debug, thiserror::Error)]
pub enum CallError<E> {
    /// The circuit is open; the wrapped function was not invoked.
    #[error("Circuit breaker '{name}' is open")]
    Open { name: String },

    /// The wrapped function ran and returned this error.
    #[error(transparent)]
    Inner(E),
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Read-only snapshot of a breaker. Taking a snapshot never mutates state.
#[derive(Debug, Clone, Serialize)]
pub struct BreakerStats {
    pub name: String,
    pub state: BreakerState,
    /// Failures counted in the current state.
    pub failure_count: u32,
    /// Probe successes counted in the current state.
    pub success_count: u32,
    pub total_requests: u64,
    pub total_failures: u64,
    pub total_successes: u64,
    /// `total_successes / total_requests` as a percentage, rounded to two
    /// decimals. Zero when no requests have been made.
    pub success_rate_percent: f64,
    /// Times the circuit has opened over its lifetime.
    pub opens: u64,
    /// Times the circuit has returned to Closed (probe recovery or reset).
    pub closes: u64,
    pub last_failure_at: Option<Timestamp>,
    pub last_success_at: Option<Timestamp>,
}

// ---------------------------------------------------------------------------
// CircuitBreaker
// ---------------------------------------------------------------------------

/// Mutable breaker state. Every read-modify-write happens inside the one
/// mutex guarding this struct; check-then-act transitions are therefore
/// atomic with respect to the state read that triggered them.
#[derive(Debug)]
struct Inner {
    state: BreakerState,
    failure_count: u32,
    success_count: u32,
    last_failure_at: Option<Timestamp>,
    last_success_at: Option<Timestamp>,
    total_requests: u64,
    total_failures: u64,
    total_successes: u64,
    opens: u64,
    closes: u64,
}

impl Inner {
    fn new() -> Self {
        Self {
            state: BreakerState::Closed,
            failure_count: 0,
            success_count: 0,
            last_failure_at: None,
            last_success_at: None,
            total_requests: 0,
            total_failures: 0,
            total_successes: 0,
            opens: 0,
            closes: 0,
        }
    }
}

/// Circuit breaker for one named dependency.
///
/// Cheap to clone through an `Arc`; breakers for different dependencies do
/// not share any lock.
pub struct CircuitBreaker {
    name: String,
    config: BreakerConfig,
    /// `config.open_timeout` pre-converted for timestamp arithmetic.
    open_timeout: chrono::Duration,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn MetricsSink>,
    inner: Mutex<Inner>,
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CircuitBreaker {
    /// Create a breaker for `name`, starting Closed.
    ///
    /// Fails with `CoreError::Validation` if the config is invalid.
    pub fn new(
        name: impl Into<String>,
        config: BreakerConfig,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn MetricsSink>,
    ) -> Result<Self, CoreError> {
        config.validate()?;
        let open_timeout = chrono::Duration::from_std(config.open_timeout)
            .map_err(|e| CoreError::Validation(format!("open_timeout out of range: {e}")))?;
        Ok(Self {
            name: name.into(),
            config,
            open_timeout,
            clock,
            sink,
            inner: Mutex::new(Inner::new()),
        })
    }

    /// The dependency name this breaker guards.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a request should be allowed through right now.
    ///
    /// In Open, returns `true` only once `open_timeout` has elapsed since the
    /// last failure, transitioning to HalfOpen as a side effect. Concurrent
    /// callers racing at the timeout boundary may both observe the
    /// transition; it is idempotent.
    pub fn allow(&self) -> bool {
        let mut inner = self.lock();
        match inner.state {
            BreakerState::Closed | BreakerState::HalfOpen => true,
            BreakerState::Open => {
                let cooled_down = match inner.last_failure_at {
                    Some(at) => self.clock.now().signed_duration_since(at) >= self.open_timeout,
                    None => true,
                };
                if cooled_down {
                    self.transition(&mut inner, BreakerState::HalfOpen);
                    tracing::info!(breaker = %self.name, "Circuit breaker probing: open -> half_open");
                }
                cooled_down
            }
        }
    }

    /// Record a successful call against the breaker.
    pub fn record_success(&self) {
        let mut inner = self.lock();
        self.on_success(&mut inner);
    }

    /// Record a failed call against the breaker.
    pub fn record_failure(&self) {
        let mut inner = self.lock();
        self.on_failure(&mut inner);
    }

    /// Administrative override: force Closed and zero both counters.
    pub fn reset(&self) {
        let mut inner = self.lock();
        if inner.state != BreakerState::Closed {
            self.transition(&mut inner, BreakerState::Closed);
        } else {
            inner.failure_count = 0;
            inner.success_count = 0;
        }
        inner.last_failure_at = None;
        tracing::info!(breaker = %self.name, "Circuit breaker manually reset");
    }

    /// Read-only snapshot of the breaker.
    pub fn stats(&self) -> BreakerStats {
        let inner = self.lock();
        let success_rate_percent = if inner.total_requests > 0 {
            let rate = inner.total_successes as f64 / inner.total_requests as f64 * 100.0;
            (rate * 100.0).round() / 100.0
        } else {
            0.0
        };
        BreakerStats {
            name: self.name.clone(),
            state: inner.state,
            failure_count: inner.failure_count,
            success_count: inner.success_count,
            total_requests: inner.total_requests,
            total_failures: inner.total_failures,
            total_successes: inner.total_successes,
            success_rate_percent,
            opens: inner.opens,
            closes: inner.closes,
            last_failure_at: inner.last_failure_at,
            last_success_at: inner.last_success_at,
        }
    }

    /// Execute `f` under breaker protection.
    ///
    /// Fails fast with [`CallError::Open`] without invoking `f` when the
    /// circuit denies the request. Otherwise runs `f` and classifies its
    /// outcome: success records a success; an error for which `is_expected`
    /// returns `true` records a failure; an unexpected error propagates
    /// without touching breaker state (programmer errors must not trip the
    /// circuit).
    ///
    /// No lock is held while `f` is awaited — only the pre/post bookkeeping
    /// runs inside the critical section.
    pub async fn call<T, E, F, Fut, P>(&self, is_expected: P, f: F) -> Result<T, CallError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
    {
        if !self.allow() {
            let mut inner = self.lock();
            inner.total_requests += 1;
            inner.total_failures += 1;
            return Err(CallError::Open {
                name: self.name.clone(),
            });
        }

        {
            let mut inner = self.lock();
            inner.total_requests += 1;
        }

        match f().await {
            Ok(value) => {
                let mut inner = self.lock();
                self.on_success(&mut inner);
                Ok(value)
            }
            Err(e) if is_expected(&e) => {
                let mut inner = self.lock();
                self.on_failure(&mut inner);
                Err(CallError::Inner(e))
            }
            Err(e) => {
                tracing::warn!(
                    breaker = %self.name,
                    "Unexpected error passed through circuit breaker without recording",
                );
                Err(CallError::Inner(e))
            }
        }
    }

    // -- internals ----------------------------------------------------------

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("breaker lock poisoned")
    }

    fn on_success(&self, inner: &mut Inner) {
        inner.last_success_at = Some(self.clock.now());
        inner.total_successes += 1;
        match inner.state {
            BreakerState::Closed => {
                inner.failure_count = 0;
            }
            BreakerState::HalfOpen => {
                inner.success_count += 1;
                if inner.success_count >= self.config.success_threshold {
                    self.transition(inner, BreakerState::Closed);
                    tracing::info!(
                        breaker = %self.name,
                        successes = self.config.success_threshold,
                        "Circuit breaker closed after successful probes",
                    );
                }
            }
            // A success in Open means the caller skipped allow(); ignore it.
            BreakerState::Open => {}
        }
    }

    fn on_failure(&self, inner: &mut Inner) {
        // In Open this extends the cooldown window.
        inner.last_failure_at = Some(self.clock.now());
        inner.total_failures += 1;
        match inner.state {
            BreakerState::Closed => {
                inner.failure_count += 1;
                if inner.failure_count >= self.config.failure_threshold {
                    let failures = inner.failure_count;
                    self.transition(inner, BreakerState::Open);
                    tracing::warn!(
                        breaker = %self.name,
                        failures,
                        "Circuit breaker opened",
                    );
                }
            }
            BreakerState::HalfOpen => {
                self.transition(inner, BreakerState::Open);
                tracing::warn!(breaker = %self.name, "Probe failed, circuit breaker reopened");
            }
            BreakerState::Open => {}
        }
    }

    /// Move to `to`, zeroing both per-state counters and updating lifetime
    /// transition totals. Counters are only meaningful relative to the
    /// current state.
    fn transition(&self, inner: &mut Inner, to: BreakerState) {
        let from = inner.state;
        inner.state = to;
        inner.failure_count = 0;
        inner.success_count = 0;
        match to {
            BreakerState::Open => inner.opens += 1,
            BreakerState::Closed => inner.closes += 1,
            BreakerState::HalfOpen => {}
        }
        self.sink
            .record_breaker_transition(&self.name, from.as_str(), to.as_str());
    }
}
