//! Shared HTTP clients for the liveness and redirect probes.

use pki_types::CertificateDer;
use reqwest::redirect::Policy;
use reqwest::{Certificate, Client, ClientBuilder};
use std::time::Duration;

use sentinel_core::config::{Config, DEFAULT_USER_AGENT};

use crate::error::ProbeError;
use crate::tls;

/// Redirect hops the liveness client follows before accepting the last response.
pub const MAX_REDIRECTS: usize = 10;

/// Knobs shared by every probe.
#[derive(Debug, Clone)]
pub struct ProbeSettings {
    /// Bound on connect, handshake and response headers for each probe.
    pub timeout: Duration,
    /// User agent sent with every request.
    pub user_agent: String,
    /// Port used by the redirect probe.
    pub http_port: u16,
    /// Port used by the certificate probe.
    pub https_port: u16,
    /// Extra roots trusted by the liveness client.
    pub extra_roots: Vec<CertificateDer<'static>>,
}

impl ProbeSettings {
    /// Settings with the standard ports and user agent.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            http_port: 80,
            https_port: 443,
            extra_roots: Vec::new(),
        }
    }

    /// Derive settings from the loaded configuration, reading `ca_file` if set.
    pub fn from_config(config: &Config) -> Result<Self, ProbeError> {
        let extra_roots = match &config.ca_file {
            Some(path) => tls::load_root_certs(path)?,
            None => Vec::new(),
        };

        Ok(Self {
            timeout: config.timeout,
            user_agent: config.user_agent.clone(),
            http_port: config.http_port,
            https_port: config.https_port,
            extra_roots,
        })
    }
}

/// The two HTTP clients the probes share.
///
/// Both have keep-alive disabled so every probe pays for, and measures, a
/// fresh connection. `reqwest::Client` is cheap to clone and safe to use from
/// many tasks at once.
#[derive(Debug, Clone)]
pub struct ProbeClients {
    /// Follows up to [`MAX_REDIRECTS`] hops.
    pub liveness: Client,
    /// Never follows redirects.
    pub no_redirect: Client,
}

impl ProbeClients {
    /// Build both clients from the shared settings.
    pub fn build(settings: &ProbeSettings) -> Result<Self, ProbeError> {
        let liveness = base_builder(settings)?
            .redirect(Policy::custom(|attempt| {
                if attempt.previous().len() >= MAX_REDIRECTS {
                    attempt.stop()
                } else {
                    attempt.follow()
                }
            }))
            .build()?;

        let no_redirect = base_builder(settings)?.redirect(Policy::none()).build()?;

        Ok(Self {
            liveness,
            no_redirect,
        })
    }
}

fn base_builder(settings: &ProbeSettings) -> Result<ClientBuilder, ProbeError> {
    let mut builder = Client::builder()
        .use_rustls_tls()
        .connect_timeout(settings.timeout)
        .timeout(settings.timeout)
        .pool_max_idle_per_host(0)
        .user_agent(settings.user_agent.clone());

    for root in &settings.extra_roots {
        builder = builder.add_root_certificate(Certificate::from_der(root.as_ref())?);
    }

    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_standard_ports() {
        let settings = ProbeSettings::new(Duration::from_secs(2));
        assert_eq!(settings.http_port, 80);
        assert_eq!(settings.https_port, 443);
        assert_eq!(settings.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn settings_follow_config() {
        let config = Config::from_yaml("timeout: 3s\nhttp_port: 8080\nuser_agent: probe/2\n").unwrap();
        let settings = ProbeSettings::from_config(&config).unwrap();
        assert_eq!(settings.timeout, Duration::from_secs(3));
        assert_eq!(settings.http_port, 8080);
        assert_eq!(settings.https_port, 443);
        assert_eq!(settings.user_agent, "probe/2");
        assert!(settings.extra_roots.is_empty());
    }

    #[test]
    fn clients_build_with_extra_roots() {
        let cert = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
        let mut settings = ProbeSettings::new(Duration::from_secs(1));
        settings.extra_roots.push(cert.cert.der().clone());

        assert!(ProbeClients::build(&settings).is_ok());
    }
}
