//! Per-dependency circuit breakers for the haulsense pipeline.
//!
//! A [`CircuitBreaker`] guards one named dependency (the ML model, the
//! database, an external API) and stops calling it for a cooldown period
//! once it has failed too often:
//!
//! - **Closed** — normal operation; failures are counted.
//! - **Open** — the dependency is considered down; requests fail fast
//!   without being executed until `open_timeout` has elapsed.
//! - **HalfOpen** — probe requests are let through; enough consecutive
//!   successes close the circuit again, any failure reopens it.
//!
//! [`BreakerRegistry`] owns the breakers by name and is an explicit,
//! process-scoped object: construct one per service (or per test) and pass
//! it where it is needed.

pub mod breaker;
pub mod registry;

pub use breaker::{BreakerConfig, BreakerState, BreakerStats, CallError, CircuitBreaker};
pub use registry::BreakerRegistry;
