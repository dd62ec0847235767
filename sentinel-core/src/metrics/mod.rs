//! Metric recording seam between the probes and an external metrics sink.
//!
//! Probes never talk to a registry directly. They produce [`crate::ProbeOutcome`]s,
//! the [`recorder::MetricRecorder`] turns those into named gauge and counter
//! observations, and a [`recorder::MetricSink`] implementation stores them.

pub mod memory;
pub mod names;
pub mod recorder;
