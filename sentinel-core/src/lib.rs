//! Sentinel Core functionality.
//!
//! This crate contains the domain models, configuration definitions, the shared
//! target registry and the metric recording seam that power the Sentinel probe engine.

pub mod config;
pub mod domain;
pub mod error;
pub mod metrics;

pub use config::Config;
pub use domain::outcome::{Observation, ProbeKind, ProbeOutcome};
pub use domain::registry::{SharedTargetRegistry, TargetRegistry};
pub use domain::target::Target;
pub use error::{ConfigError, TargetError};
pub use metrics::recorder::{MetricRecorder, MetricSink};
