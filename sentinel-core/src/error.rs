//! Error types shared across the Sentinel crates.

use std::path::PathBuf;
use thiserror::Error;

/// Reasons a raw target cannot become a [`crate::Target`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TargetError {
    /// The host part was empty.
    #[error("target host must not be empty")]
    EmptyHost,

    /// The URL did not parse at all.
    #[error("invalid url {url:?}: {reason}")]
    InvalidUrl {
        /// The rejected input.
        url: String,
        /// Parser message.
        reason: String,
    },

    /// The URL parsed but lacks a scheme or a host.
    #[error("url must include scheme and host: {0:?}")]
    MissingSchemeOrHost(String),
}

/// Failures while loading or validating the YAML configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("reading config {path}: {source}")]
    Read {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid YAML for the expected shape.
    #[error("parsing config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A duration field did not parse.
    #[error("invalid {field} {value:?}: {reason}")]
    InvalidDuration {
        /// Name of the field (`interval` or `timeout`).
        field: &'static str,
        /// The raw value.
        value: String,
        /// Parser message.
        reason: String,
    },

    /// The metrics listen address did not parse.
    #[error("invalid metrics_addr {0:?}")]
    InvalidAddress(String),

    /// A listed target was rejected.
    #[error("target {index}: {source}")]
    InvalidTarget {
        /// Position in the `targets` list.
        index: usize,
        /// Why it was rejected.
        #[source]
        source: TargetError,
    },
}
