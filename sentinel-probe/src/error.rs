//! Probe engine errors.
//!
//! Only construction can fail. Once the engine runs, every probe failure is
//! turned into a negative observation instead.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failures while building the shared probe clients.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The HTTP client could not be constructed.
    #[error("building http client: {0}")]
    Client(#[from] reqwest::Error),

    /// The TLS client configuration was rejected.
    #[error("building tls config: {0}")]
    Tls(#[from] rustls::Error),

    /// The CA bundle could not be read.
    #[error("reading ca bundle {path}: {source}")]
    CaBundle {
        /// Path of the bundle.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The CA bundle held no certificates.
    #[error("ca bundle {0} contains no certificates")]
    EmptyCaBundle(PathBuf),
}

/// Why a certificate probe saw no usable leaf certificate.
#[derive(Debug, Error)]
pub(crate) enum HandshakeError {
    #[error("host is not a valid tls server name")]
    InvalidServerName,

    #[error("connect and handshake did not finish within {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("no peer certificates")]
    NoPeerCertificates,
}
