//! Certificate probe: inspect the leaf certificate a host serves.
//!
//! The handshake itself never rejects a certificate (see [`crate::tls`]). The
//! probe then judges the leaf on its own: the validity window must contain
//! "now" and the certificate must be issued for the probed hostname. Chain
//! trust is deliberately not part of the verdict, so a self-signed but
//! time-valid, hostname-correct certificate reports as valid.

use pki_types::{CertificateDer, ServerName};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::net::TcpStream;
use tokio::time;
use tokio_rustls::TlsConnector;
use tracing::{info, warn};
use x509_parser::prelude::{FromDer, X509Certificate};

use sentinel_core::Observation;

use crate::error::{HandshakeError, ProbeError};
use crate::tls;

const SECS_PER_DAY: f64 = 86_400.0;

/// Validity facts read from one leaf certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CertificateSnapshot {
    /// `notBefore` as a unix timestamp.
    pub not_before: i64,
    /// `notAfter` as a unix timestamp.
    pub not_after: i64,
    /// Whether the certificate names the probed host.
    pub subject_matches_host: bool,
}

impl CertificateSnapshot {
    /// Parse `leaf` and match it against `host`.
    ///
    /// Returns `None` when the DER cannot be parsed. Hostname matching follows
    /// the usual rules: DNS SANs with single-label wildcards, IP SANs for
    /// address literals.
    pub fn inspect(leaf: &CertificateDer<'_>, host: &str) -> Option<Self> {
        let (_, parsed) = X509Certificate::from_der(leaf.as_ref()).ok()?;
        let validity = parsed.validity();

        Some(Self {
            not_before: validity.not_before.timestamp(),
            not_after: validity.not_after.timestamp(),
            subject_matches_host: matches_host(leaf, host),
        })
    }

    /// Signed seconds from `now` until `notAfter`; negative once expired.
    pub fn expires_in_secs(&self, now: SystemTime) -> f64 {
        self.not_after as f64 - unix_secs(now)
    }

    /// Whether `now` lies within `[notBefore, notAfter]`.
    pub fn in_validity_window(&self, now: SystemTime) -> bool {
        let now = unix_secs(now);
        now >= self.not_before as f64 && now <= self.not_after as f64
    }

    /// Time window and hostname both check out.
    pub fn is_valid_at(&self, now: SystemTime) -> bool {
        self.in_validity_window(now) && self.subject_matches_host
    }
}

/// Connects to `host:port`, completes a handshake and judges the leaf.
#[derive(Clone)]
pub struct CertificateProbe {
    connector: TlsConnector,
    port: u16,
    timeout: Duration,
}

impl CertificateProbe {
    /// Build a probe for the given port, bounding connect + handshake by `timeout`.
    pub fn new(port: u16, timeout: Duration) -> Result<Self, ProbeError> {
        let config = tls::inspection_client_config()?;
        Ok(Self {
            connector: TlsConnector::from(config),
            port,
            timeout,
        })
    }

    /// Probe `host` once.
    ///
    /// A failed connection, a failed handshake, no peer certificate or an
    /// unparseable leaf all report invalid with a zero expiry.
    pub async fn check(&self, host: &str) -> Observation {
        let leaf = match self.fetch_leaf(host).await {
            Ok(leaf) => leaf,
            Err(err) => {
                warn!(host, error = %err, "tls handshake failed");
                return unusable();
            }
        };

        let Some(snapshot) = CertificateSnapshot::inspect(&leaf, host) else {
            warn!(host, "unparseable leaf certificate");
            return unusable();
        };

        let now = SystemTime::now();
        let expires_in_secs = snapshot.expires_in_secs(now);

        let valid = if !snapshot.in_validity_window(now) {
            warn!(
                host,
                not_before = snapshot.not_before,
                not_after = snapshot.not_after,
                "certificate not valid"
            );
            false
        } else if !snapshot.subject_matches_host {
            warn!(host, "certificate hostname mismatch");
            false
        } else {
            info!(
                host,
                expires_in_days = (expires_in_secs / SECS_PER_DAY) as i64,
                "certificate valid"
            );
            true
        };

        Observation::Certificate {
            valid,
            expires_in_secs,
        }
    }

    async fn fetch_leaf(&self, host: &str) -> Result<CertificateDer<'static>, HandshakeError> {
        let server_name =
            ServerName::try_from(host.to_string()).map_err(|_| HandshakeError::InvalidServerName)?;

        let handshake = async {
            let stream = TcpStream::connect((host, self.port)).await?;
            let tls_stream = self.connector.connect(server_name, stream).await?;
            let (_, connection) = tls_stream.get_ref();
            connection
                .peer_certificates()
                .and_then(|certs| certs.first())
                .cloned()
                .ok_or(HandshakeError::NoPeerCertificates)
        };

        time::timeout(self.timeout, handshake)
            .await
            .map_err(|_| HandshakeError::Timeout(self.timeout))?
    }
}

impl std::fmt::Debug for CertificateProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertificateProbe")
            .field("port", &self.port)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

fn unusable() -> Observation {
    Observation::Certificate {
        valid: false,
        expires_in_secs: 0.0,
    }
}

fn matches_host(leaf: &CertificateDer<'_>, host: &str) -> bool {
    let Ok(server_name) = ServerName::try_from(host) else {
        return false;
    };
    match webpki::EndEntityCert::try_from(leaf) {
        Ok(cert) => cert.verify_is_valid_for_subject_name(&server_name).is_ok(),
        Err(_) => false,
    }
}

fn unix_secs(t: SystemTime) -> f64 {
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs_f64(),
        Err(e) => -e.duration().as_secs_f64(),
    }
}
