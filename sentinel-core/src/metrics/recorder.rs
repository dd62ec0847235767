//! Translation of probe outcomes into metric observations.

use std::fmt;
use std::sync::Arc;

use crate::domain::outcome::{Observation, ProbeOutcome};
use crate::metrics::names::*;

/// An external metrics store.
///
/// Implementations must be safe to call from many probe tasks at once; the
/// engine does no locking of its own around these calls. Label sets are
/// passed as `(name, value)` pairs and may be high-cardinality (host x URL).
pub trait MetricSink: Send + Sync {
    /// Set the gauge `name` for the given label set.
    fn set_gauge(&self, name: &str, labels: &[(&str, &str)], value: f64);

    /// Increment the counter `name` for the given label set by one.
    fn increment_counter(&self, name: &str, labels: &[(&str, &str)]);
}

/// Forwards structured probe outcomes to a [`MetricSink`].
#[derive(Clone)]
pub struct MetricRecorder {
    sink: Arc<dyn MetricSink>,
}

impl MetricRecorder {
    /// Wrap a sink.
    pub fn new(sink: Arc<dyn MetricSink>) -> Self {
        Self { sink }
    }

    /// Publish every metric an outcome maps to.
    pub fn record(&self, outcome: &ProbeOutcome) {
        let host = outcome.target.host();
        let url = outcome.target.url();

        match outcome.observation {
            Observation::Liveness {
                up,
                status_code,
                latency,
            } => {
                let labels = [(LABEL_HOST, host), (LABEL_URL, url)];
                self.sink.set_gauge(TARGET_UP, &labels, flag(up));
                self.sink
                    .set_gauge(TARGET_STATUS_CODE, &labels, f64::from(status_code));
                self.sink
                    .set_gauge(TARGET_LATENCY_SECONDS, &labels, latency.as_secs_f64());

                let result = if up { RESULT_SUCCESS } else { RESULT_FAILURE };
                self.sink.increment_counter(
                    CHECKS_TOTAL,
                    &[(LABEL_HOST, host), (LABEL_URL, url), (LABEL_RESULT, result)],
                );
            }
            Observation::TlsRedirect { enforced } => {
                self.sink
                    .set_gauge(TLS_REDIRECT, &[(LABEL_HOST, host)], flag(enforced));
            }
            Observation::Certificate {
                valid,
                expires_in_secs,
            } => {
                let labels = [(LABEL_HOST, host)];
                self.sink
                    .set_gauge(TLS_CERT_EXPIRY_SECONDS, &labels, expires_in_secs);
                self.sink.set_gauge(TLS_CERT_VALID, &labels, flag(valid));
            }
        }
    }
}

impl fmt::Debug for MetricRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricRecorder").finish_non_exhaustive()
    }
}

fn flag(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}
