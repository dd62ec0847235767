//! In-memory metric sink.
//!
//! Keeps the latest gauge values and counter totals in `DashMap`s so concurrent
//! probe tasks can write without a global lock. Used for dry runs and as the
//! capturing sink in tests.

use dashmap::DashMap;

use crate::metrics::recorder::MetricSink;

type SeriesKey = (String, Vec<(String, String)>);

/// A [`MetricSink`] that keeps everything in memory.
#[derive(Debug, Default)]
pub struct MemoryRecorder {
    gauges: DashMap<SeriesKey, f64>,
    counters: DashMap<SeriesKey, u64>,
}

impl MemoryRecorder {
    /// Creates a new empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest value of a gauge series, if it was ever set.
    ///
    /// Label order does not matter.
    pub fn gauge(&self, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
        self.gauges.get(&key(name, labels)).map(|v| *v)
    }

    /// Current total of a counter series (0 if never incremented).
    pub fn counter(&self, name: &str, labels: &[(&str, &str)]) -> u64 {
        self.counters.get(&key(name, labels)).map_or(0, |v| *v)
    }

    /// Sum of a counter across every label set.
    pub fn counter_total(&self, name: &str) -> u64 {
        self.counters
            .iter()
            .filter(|entry| entry.key().0 == name)
            .map(|entry| *entry.value())
            .sum()
    }

    /// Number of distinct series recorded for a gauge.
    pub fn gauge_series(&self, name: &str) -> usize {
        self.gauges.iter().filter(|entry| entry.key().0 == name).count()
    }
}

impl MetricSink for MemoryRecorder {
    fn set_gauge(&self, name: &str, labels: &[(&str, &str)], value: f64) {
        self.gauges.insert(key(name, labels), value);
    }

    fn increment_counter(&self, name: &str, labels: &[(&str, &str)]) {
        *self.counters.entry(key(name, labels)).or_insert(0) += 1;
    }
}

fn key(name: &str, labels: &[(&str, &str)]) -> SeriesKey {
    let mut labels: Vec<(String, String)> = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    labels.sort();
    (name.to_string(), labels)
}
