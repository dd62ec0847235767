//! Runs every probe for one target and records the outcomes.

use tracing::debug;

use sentinel_core::{MetricRecorder, ProbeOutcome, Target};

use crate::client::{ProbeClients, ProbeSettings};
use crate::error::ProbeError;
use crate::health_check::certificate::CertificateProbe;
use crate::health_check::{liveness, redirect};

/// Owns the shared clients and the recorder every per-target task uses.
#[derive(Debug, Clone)]
pub struct Prober {
    clients: ProbeClients,
    certificate: CertificateProbe,
    http_port: u16,
    recorder: MetricRecorder,
}

impl Prober {
    /// Build the shared clients from `settings`.
    pub fn new(settings: &ProbeSettings, recorder: MetricRecorder) -> Result<Self, ProbeError> {
        Ok(Self {
            clients: ProbeClients::build(settings)?,
            certificate: CertificateProbe::new(settings.https_port, settings.timeout)?,
            http_port: settings.http_port,
            recorder,
        })
    }

    /// Liveness, then the redirect and certificate probes, for one target.
    ///
    /// All three always run, whatever the earlier ones observed. Each outcome
    /// is recorded as soon as it is known and returned in probe order.
    pub async fn probe_target(&self, target: &Target) -> Vec<ProbeOutcome> {
        let mut outcomes = Vec::with_capacity(3);

        let observation = liveness::check(&self.clients.liveness, target).await;
        outcomes.push(self.record(target, observation));

        let observation =
            redirect::check(&self.clients.no_redirect, target.host(), self.http_port).await;
        outcomes.push(self.record(target, observation));

        let observation = self.certificate.check(target.host()).await;
        outcomes.push(self.record(target, observation));

        outcomes
    }

    fn record(&self, target: &Target, observation: sentinel_core::Observation) -> ProbeOutcome {
        let outcome = ProbeOutcome::now(target.clone(), observation);
        debug!(
            host = target.host(),
            probe = outcome.kind().as_str(),
            passed = outcome.observation.passed(),
            "probe finished"
        );
        self.recorder.record(&outcome);
        outcome
    }
}
