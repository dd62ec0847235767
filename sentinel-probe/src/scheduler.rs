//! Cycle scheduler.
//!
//! One cycle runs immediately on start, then one per interval. A cycle takes a
//! snapshot of the registry, spawns one task per target into a `JoinSet` and
//! waits for all of them before the next tick is considered, so cycles never
//! overlap. Cancellation is only observed between cycles: an in-flight cycle
//! always finishes, bounded by the per-probe timeout.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use sentinel_core::{MetricRecorder, MetricSink, SharedTargetRegistry, Target, TargetRegistry};

use crate::client::ProbeSettings;
use crate::error::ProbeError;
use crate::health_check::prober::Prober;

/// Summary of one finished cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Targets in the snapshot the cycle started from.
    pub targets: usize,
    /// Per-target tasks that ran to completion.
    pub completed: usize,
    /// Per-target tasks that panicked.
    pub failed: usize,
}

/// Handle a discovery source holds to push new target lists.
#[derive(Debug, Clone)]
pub struct TargetUpdater {
    registry: SharedTargetRegistry,
}

impl TargetUpdater {
    /// Replace the target set; the next cycle picks it up.
    pub fn update(&self, targets: Vec<Target>) {
        self.registry.replace(targets);
    }
}

/// The probe engine.
#[derive(Debug)]
pub struct Checker {
    registry: SharedTargetRegistry,
    prober: Arc<Prober>,
    interval: Duration,
}

impl Checker {
    /// Build the engine with its initial targets and shared probe clients.
    pub fn new(
        settings: &ProbeSettings,
        interval: Duration,
        targets: Vec<Target>,
        sink: Arc<dyn MetricSink>,
    ) -> Result<Self, ProbeError> {
        let prober = Prober::new(settings, MetricRecorder::new(sink))?;
        Ok(Self {
            registry: Arc::new(TargetRegistry::new(targets)),
            prober: Arc::new(prober),
            interval,
        })
    }

    /// Replace the target set. Safe to call while a cycle is running; the
    /// running cycle keeps its snapshot.
    pub fn update_targets(&self, targets: Vec<Target>) {
        self.registry.replace(targets);
    }

    /// A cloneable handle for discovery sources.
    pub fn updater(&self) -> TargetUpdater {
        TargetUpdater {
            registry: Arc::clone(&self.registry),
        }
    }

    /// The current target set.
    pub fn targets(&self) -> Arc<Vec<Target>> {
        self.registry.snapshot()
    }

    /// Loop until `shutdown` is cancelled. Returns the number of cycles run.
    pub async fn run(&self, shutdown: CancellationToken) -> u64 {
        info!(
            targets = self.registry.len(),
            interval = ?self.interval,
            "starting checker"
        );

        let mut cycles = 0;
        if shutdown.is_cancelled() {
            info!(cycles, "checker stopped");
            return cycles;
        }

        self.run_cycle().await;
        cycles += 1;

        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    self.run_cycle().await;
                    cycles += 1;
                }
            }
        }

        info!(cycles, "checker stopped");
        cycles
    }

    /// Probe every target in the current snapshot once and wait for all of them.
    pub async fn run_cycle(&self) -> CycleReport {
        let targets = self.registry.snapshot();
        info!(targets = targets.len(), "running checks");

        let mut tasks = JoinSet::new();
        for target in targets.iter().cloned() {
            let prober = Arc::clone(&self.prober);
            tasks.spawn(async move {
                prober.probe_target(&target).await;
            });
        }

        let mut report = CycleReport {
            targets: targets.len(),
            ..CycleReport::default()
        };
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(()) => report.completed += 1,
                Err(err) => {
                    error!(error = %err, "probe task failed");
                    report.failed += 1;
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_core::metrics::memory::MemoryRecorder;
    use sentinel_core::metrics::names::CHECKS_TOTAL;

    fn closed_port() -> u16 {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    fn checker(targets: Vec<Target>, sink: Arc<MemoryRecorder>) -> Checker {
        let port = closed_port();
        let mut settings = ProbeSettings::new(Duration::from_millis(500));
        settings.http_port = port;
        settings.https_port = port;
        Checker::new(&settings, Duration::from_millis(50), targets, sink).unwrap()
    }

    fn unreachable_targets(n: usize) -> Vec<Target> {
        let port = closed_port();
        (0..n)
            .map(|_| Target::new(format!("http://127.0.0.1:{port}/"), "127.0.0.1").unwrap())
            .collect()
    }

    #[tokio::test]
    async fn every_target_is_attempted_even_when_all_fail() {
        let sink = Arc::new(MemoryRecorder::new());
        let checker = checker(unreachable_targets(4), Arc::clone(&sink));

        let report = checker.run_cycle().await;

        assert_eq!(
            report,
            CycleReport {
                targets: 4,
                completed: 4,
                failed: 0
            }
        );
        assert_eq!(sink.counter_total(CHECKS_TOTAL), 4);
    }

    #[tokio::test]
    async fn empty_registry_runs_an_empty_cycle() {
        let sink = Arc::new(MemoryRecorder::new());
        let checker = checker(Vec::new(), Arc::clone(&sink));

        assert_eq!(checker.run_cycle().await, CycleReport::default());
        assert_eq!(sink.counter_total(CHECKS_TOTAL), 0);
    }

    #[tokio::test]
    async fn update_is_seen_by_the_next_cycle() {
        let sink = Arc::new(MemoryRecorder::new());
        let checker = checker(unreachable_targets(1), Arc::clone(&sink));

        checker.updater().update(unreachable_targets(3));
        assert_eq!(checker.targets().len(), 3);

        let report = checker.run_cycle().await;
        assert_eq!(report.targets, 3);
        assert_eq!(sink.counter_total(CHECKS_TOTAL), 3);
    }

    #[tokio::test]
    async fn cancelled_before_start_runs_nothing() {
        let sink = Arc::new(MemoryRecorder::new());
        let checker = checker(unreachable_targets(2), Arc::clone(&sink));
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        assert_eq!(checker.run(shutdown).await, 0);
        assert_eq!(sink.counter_total(CHECKS_TOTAL), 0);
    }

    #[tokio::test]
    async fn cancellation_between_ticks_stops_further_cycles() {
        let sink = Arc::new(MemoryRecorder::new());
        let checker = Arc::new(checker(unreachable_targets(1), Arc::clone(&sink)));
        let shutdown = CancellationToken::new();

        let handle = tokio::spawn({
            let checker = Arc::clone(&checker);
            let shutdown = shutdown.clone();
            async move { checker.run(shutdown).await }
        });

        tokio::time::sleep(Duration::from_millis(200)).await;
        shutdown.cancel();
        let cycles = handle.await.unwrap();

        assert!(cycles >= 1);
        // Every cycle that started also finished: one liveness check per cycle.
        assert_eq!(sink.counter_total(CHECKS_TOTAL), cycles);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(sink.counter_total(CHECKS_TOTAL), cycles);
    }

    #[tokio::test]
    async fn cycle_in_flight_at_cancellation_finishes() {
        // Accepts connections and never answers, so liveness hangs until its timeout.
        let silent = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = silent.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = silent.accept().await {
                held.push(stream);
            }
        });

        let port = closed_port();
        let mut settings = ProbeSettings::new(Duration::from_millis(800));
        settings.http_port = port;
        settings.https_port = port;
        let sink = Arc::new(MemoryRecorder::new());
        let target = Target::new(format!("http://{addr}/"), "127.0.0.1").unwrap();
        let checker = Arc::new(
            Checker::new(&settings, Duration::from_millis(50), vec![target], sink.clone()).unwrap(),
        );
        let shutdown = CancellationToken::new();

        let handle = tokio::spawn({
            let checker = Arc::clone(&checker);
            let shutdown = shutdown.clone();
            async move { checker.run(shutdown).await }
        });

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(sink.counter_total(CHECKS_TOTAL), 0);
        shutdown.cancel();

        let cycles = handle.await.unwrap();
        assert_eq!(cycles, 1);
        assert_eq!(sink.counter_total(CHECKS_TOTAL), 1);
    }
}
