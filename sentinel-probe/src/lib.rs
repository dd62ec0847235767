//! Sentinel Probe Engine
//!
//! Holds the live target set, runs one probe cycle per interval and fans out a
//! liveness, redirect and certificate probe for every target, forwarding each
//! outcome to the configured metric sink.

pub mod client;
pub mod error;
pub mod health_check;
pub mod logging;
pub mod scheduler;
pub mod tls;

pub use client::{ProbeClients, ProbeSettings};
pub use error::ProbeError;
pub use health_check::prober::Prober;
pub use scheduler::{Checker, CycleReport, TargetUpdater};
