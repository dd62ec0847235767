//! Sentinel Exporter
//!
//! Exposes recorded probe metrics in the Prometheus text format and serves the
//! process liveness endpoint.

pub mod error;
pub mod server;
pub mod sink;

pub use error::ExporterError;
pub use server::{serve, serve_listener};
pub use sink::PrometheusSink;
