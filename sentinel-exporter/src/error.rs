//! Exporter errors.

use std::net::SocketAddr;
use thiserror::Error;

/// Failures while building the registry or binding the scrape server.
#[derive(Debug, Error)]
pub enum ExporterError {
    /// Metric creation, registration or encoding failed.
    #[error("prometheus: {0}")]
    Prometheus(#[from] prometheus::Error),

    /// The listen socket could not be bound.
    #[error("binding metrics server on {addr}: {source}")]
    Bind {
        /// Requested address.
        addr: SocketAddr,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
