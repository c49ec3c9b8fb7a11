//! Statistical data-quality monitoring for fleet telemetry.
//!
//! [`DataQualityMonitor`] scores every incoming reading against hard
//! physical limits, each machine's own running statistical profile, and a
//! small set of cross-sensor plausibility rules, producing a
//! [`QualityReport`] the prediction layer uses to decide how much to trust
//! the data.
//!
//! Profiles are built online — no raw history is retained — and favor
//! recent behavior over a true population statistic, because machine
//! baselines drift with wear.

pub mod config;
pub mod issue;
pub mod monitor;
pub mod profile;

pub use config::{CorrelationRules, MonitorConfig, SensorRange, SensorRanges};
pub use issue::{IssueKind, QualityIssue, QualityLevel, QualityReport, Severity};
pub use monitor::{DataQualityMonitor, FleetQualityReport};
pub use profile::{MachineProfile, SensorStats};
