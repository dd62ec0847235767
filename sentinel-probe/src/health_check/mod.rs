//! The three per-target probes and the prober that runs them together.

pub mod certificate;
pub mod liveness;
pub mod prober;
pub mod redirect;
