//! Probe outcome records.
//!
//! Outcomes are produced by one probe invocation and handed straight to the
//! [`crate::MetricRecorder`]; nothing keeps them across cycles.

use std::time::{Duration, SystemTime};

use crate::domain::target::Target;

/// Which of the three probes produced an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeKind {
    /// GET against the target URL.
    Liveness,
    /// Plaintext request expected to redirect to HTTPS.
    TlsRedirect,
    /// Leaf certificate inspection on the TLS port.
    Certificate,
}

impl ProbeKind {
    /// Stable lowercase name, used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeKind::Liveness => "liveness",
            ProbeKind::TlsRedirect => "tls_redirect",
            ProbeKind::Certificate => "certificate",
        }
    }
}

/// What a probe observed.
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    /// Liveness result.
    Liveness {
        /// Whether the endpoint counts as up (status in `[200, 500)`).
        up: bool,
        /// Last HTTP status code, `0` when no response arrived.
        status_code: u16,
        /// Time until the response headers arrived (or the failure surfaced).
        latency: Duration,
    },
    /// Redirect enforcement result.
    TlsRedirect {
        /// Whether plaintext traffic is redirected to `https://`.
        enforced: bool,
    },
    /// Certificate inspection result.
    Certificate {
        /// Time-window and hostname check result.
        valid: bool,
        /// Signed seconds until `notAfter`; `0` when no certificate was seen.
        expires_in_secs: f64,
    },
}

impl Observation {
    /// The probe kind this observation belongs to.
    pub fn kind(&self) -> ProbeKind {
        match self {
            Observation::Liveness { .. } => ProbeKind::Liveness,
            Observation::TlsRedirect { .. } => ProbeKind::TlsRedirect,
            Observation::Certificate { .. } => ProbeKind::Certificate,
        }
    }

    /// Whether the observation is a positive signal.
    pub fn passed(&self) -> bool {
        match *self {
            Observation::Liveness { up, .. } => up,
            Observation::TlsRedirect { enforced } => enforced,
            Observation::Certificate { valid, .. } => valid,
        }
    }
}

/// A single per-target, per-probe result.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeOutcome {
    /// The probed target.
    pub target: Target,
    /// What was observed.
    pub observation: Observation,
    /// When the probe finished.
    pub observed_at: SystemTime,
}

impl ProbeOutcome {
    /// Stamp an observation for `target` with the current time.
    pub fn now(target: Target, observation: Observation) -> Self {
        Self {
            target,
            observation,
            observed_at: SystemTime::now(),
        }
    }

    /// Shorthand for `self.observation.kind()`.
    pub fn kind(&self) -> ProbeKind {
        self.observation.kind()
    }
}
