//! Prometheus-backed metric sink.

use prometheus::{CounterVec, GaugeVec, Opts, Registry, TextEncoder};
use std::collections::HashMap;
use std::fmt;
use tracing::warn;

use sentinel_core::metrics::names::*;
use sentinel_core::MetricSink;

use crate::error::ExporterError;

/// Namespace prefixed to every exposed metric name.
pub const NAMESPACE: &str = "sentinel";

const TARGET_LABELS: &[&str] = &[LABEL_HOST, LABEL_URL];
const HOST_LABELS: &[&str] = &[LABEL_HOST];

/// Stores probe metrics in a private `prometheus::Registry`.
///
/// Every metric family is registered up front, so a scrape before the first
/// cycle already lists the families (with no series).
pub struct PrometheusSink {
    registry: Registry,
    gauges: HashMap<&'static str, GaugeVec>,
    counters: HashMap<&'static str, CounterVec>,
}

impl PrometheusSink {
    /// Create the sink and register the probe metric families.
    pub fn new() -> Result<Self, ExporterError> {
        let registry = Registry::new();

        let gauge_specs: [(&'static str, &str, &[&str]); 6] = [
            (
                TARGET_UP,
                "Whether the target is reachable (1 = up, 0 = down).",
                TARGET_LABELS,
            ),
            (
                TARGET_STATUS_CODE,
                "HTTP status code returned by the target.",
                TARGET_LABELS,
            ),
            (
                TARGET_LATENCY_SECONDS,
                "Latency of the HTTP check in seconds.",
                TARGET_LABELS,
            ),
            (
                TLS_REDIRECT,
                "Whether HTTP redirects to HTTPS (1 = yes, 0 = no).",
                HOST_LABELS,
            ),
            (
                TLS_CERT_EXPIRY_SECONDS,
                "Seconds until the TLS certificate expires.",
                HOST_LABELS,
            ),
            (
                TLS_CERT_VALID,
                "Whether the TLS certificate is valid (1 = valid, 0 = invalid).",
                HOST_LABELS,
            ),
        ];

        let mut gauges = HashMap::new();
        for (name, help, labels) in gauge_specs {
            let vec = GaugeVec::new(Opts::new(name, help).namespace(NAMESPACE), labels)?;
            registry.register(Box::new(vec.clone()))?;
            gauges.insert(name, vec);
        }

        let checks = CounterVec::new(
            Opts::new(CHECKS_TOTAL, "Total number of checks performed.").namespace(NAMESPACE),
            &[LABEL_HOST, LABEL_URL, LABEL_RESULT],
        )?;
        registry.register(Box::new(checks.clone()))?;
        let counters = HashMap::from([(CHECKS_TOTAL, checks)]);

        Ok(Self {
            registry,
            gauges,
            counters,
        })
    }

    /// The underlying registry, for callers that want to add their own collectors.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encode every registered family in the text exposition format.
    pub fn render(&self) -> Result<String, ExporterError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        Ok(encoder.encode_to_string(&metric_families)?)
    }
}

impl fmt::Debug for PrometheusSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrometheusSink")
            .field("gauges", &self.gauges.keys().collect::<Vec<_>>())
            .field("counters", &self.counters.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl MetricSink for PrometheusSink {
    fn set_gauge(&self, name: &str, labels: &[(&str, &str)], value: f64) {
        let Some(vec) = self.gauges.get(name) else {
            warn!(metric = name, "unknown gauge, observation dropped");
            return;
        };
        let labels: HashMap<&str, &str> = labels.iter().copied().collect();
        match vec.get_metric_with(&labels) {
            Ok(gauge) => gauge.set(value),
            Err(error) => warn!(metric = name, %error, "gauge label mismatch, observation dropped"),
        }
    }

    fn increment_counter(&self, name: &str, labels: &[(&str, &str)]) {
        let Some(vec) = self.counters.get(name) else {
            warn!(metric = name, "unknown counter, observation dropped");
            return;
        };
        let labels: HashMap<&str, &str> = labels.iter().copied().collect();
        match vec.get_metric_with(&labels) {
            Ok(counter) => counter.inc(),
            Err(error) => warn!(metric = name, %error, "counter label mismatch, observation dropped"),
        }
    }
}
