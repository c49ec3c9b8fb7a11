//! Shared domain types for the haulsense resilience core.
//!
//! This crate provides the building blocks used by every other haulsense
//! crate:
//!
//! - [`types`] — the telemetry reading, sensor enumeration, and timestamp
//!   alias.
//! - [`error`] — the shared [`CoreError`] enum.
//! - [`clock`] — the injectable [`Clock`] capability for deterministic
//!   time-based tests.
//! - [`observability`] — fire-and-forget metrics/logging sinks.
//! - [`metric_names`] — canonical metric and field name constants.
//!
//! It has zero internal dependencies so that downstream crates (breaker,
//! quality, prediction) can all depend on it without cycles.

pub mod clock;
pub mod error;
pub mod metric_names;
pub mod observability;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::CoreError;
pub use observability::{MetricsSink, NullSink, RecordingSink, SinkEvent, TracingSink};
pub use types::{Sensor, TelemetryReading, Timestamp};
