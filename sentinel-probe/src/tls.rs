//! TLS client configuration for the probes.
//!
//! The certificate probe connects with chain verification switched off: it
//! wants to *read* the peer certificate and report on it, not refuse the
//! connection. Handshake signatures are still checked, so the peer must hold
//! the key for the certificate it presents.

use pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{self, CryptoProvider};
use rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use crate::error::ProbeError;

/// Accepts any certificate chain and leaves judgement to the caller.
#[derive(Debug)]
pub struct InspectOnlyVerifier {
    provider: Arc<CryptoProvider>,
}

impl InspectOnlyVerifier {
    /// Build a verifier that checks handshake signatures with `provider`.
    pub fn new(provider: Arc<CryptoProvider>) -> Self {
        Self { provider }
    }
}

impl ServerCertVerifier for InspectOnlyVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

/// The crypto provider every probe connection uses.
pub fn crypto_provider() -> Arc<CryptoProvider> {
    Arc::new(rustls::crypto::ring::default_provider())
}

/// Builds the `ClientConfig` used by the certificate probe.
pub fn inspection_client_config() -> Result<Arc<ClientConfig>, ProbeError> {
    let provider = crypto_provider();
    let config = ClientConfig::builder_with_provider(Arc::clone(&provider))
        .with_safe_default_protocol_versions()?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(InspectOnlyVerifier::new(provider)))
        .with_no_client_auth();

    Ok(Arc::new(config))
}

/// Loads every certificate from a PEM bundle.
pub fn load_root_certs<P: AsRef<Path>>(path: P) -> Result<Vec<CertificateDer<'static>>, ProbeError> {
    let path = path.as_ref();
    let io_err = |source| ProbeError::CaBundle {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(io_err)?;
    let mut reader = BufReader::new(file);
    let certs: Vec<CertificateDer<'static>> = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_err)?;

    if certs.is_empty() {
        return Err(ProbeError::EmptyCaBundle(path.to_path_buf()));
    }
    Ok(certs)
}
