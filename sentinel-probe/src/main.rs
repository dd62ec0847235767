//! Sentinel
//!
//! Loads the configuration, starts the scrape server and runs the probe engine
//! until SIGINT or SIGTERM.

#![deny(missing_docs)]

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use sentinel_core::{Config, MetricSink};
use sentinel_exporter::PrometheusSink;
use sentinel_probe::logging::{init_tracing, LogFormat};
use sentinel_probe::{Checker, ProbeSettings, TargetUpdater};

/// Endpoint health prober exporting Prometheus gauges.
#[derive(Debug, Parser)]
#[command(name = "sentinel", version, about)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Default log filter when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log line format.
    #[arg(long, value_enum, default_value_t = LogFormat::Json)]
    log_format: LogFormat,

    /// Start with defaults and no targets when the config file cannot be loaded.
    #[arg(long)]
    allow_missing_config: bool,
}

/// The primary entrypoint for the Sentinel prober.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_format).context("initialising logging")?;

    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(err) if cli.allow_missing_config => {
            warn!(error = %err, "failed to load config, starting with defaults");
            Config::default()
        }
        Err(err) => {
            error!(error = %err, "failed to load config");
            return Err(err).context("loading configuration");
        }
    };

    info!(
        targets = config.targets.len(),
        interval = ?config.interval,
        timeout = ?config.timeout,
        metrics_addr = %config.metrics_addr,
        "sentinel starting"
    );

    let shutdown = CancellationToken::new();

    let sink = Arc::new(PrometheusSink::new().context("registering metrics")?);
    let mut server = tokio::spawn(sentinel_exporter::serve(
        config.metrics_addr,
        Arc::clone(&sink),
        shutdown.clone(),
    ));

    let settings = ProbeSettings::from_config(&config).context("building probe settings")?;
    let checker = Arc::new(
        Checker::new(
            &settings,
            config.interval,
            config.targets.clone(),
            sink as Arc<dyn MetricSink>,
        )
        .context("building checker")?,
    );

    spawn_config_reload(cli.config.clone(), checker.updater(), shutdown.clone());

    let engine = tokio::spawn({
        let checker = Arc::clone(&checker);
        let shutdown = shutdown.clone();
        async move { checker.run(shutdown).await }
    });

    tokio::select! {
        joined = &mut server => {
            shutdown.cancel();
            joined.context("metrics server task")?.context("metrics server")?;
            return Ok(());
        }
        signal = shutdown_signal() => signal.context("installing signal handlers")?,
    }

    info!("shutting down");
    shutdown.cancel();

    engine.await.context("checker task")?;
    server.await.context("metrics server task")?.context("metrics server")?;
    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        res = tokio::signal::ctrl_c() => res,
        _ = terminate.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

/// Re-read the config on SIGHUP and push its targets to the checker.
#[cfg(unix)]
fn spawn_config_reload(path: PathBuf, updater: TargetUpdater, shutdown: CancellationToken) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let mut hangup = match signal(SignalKind::hangup()) {
            Ok(hangup) => hangup,
            Err(err) => {
                warn!(error = %err, "config reload on SIGHUP unavailable");
                return;
            }
        };

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                received = hangup.recv() => {
                    if received.is_none() {
                        break;
                    }
                    match Config::load(&path) {
                        Ok(config) => updater.update(config.targets),
                        Err(err) => warn!(error = %err, path = %path.display(), "config reload failed, keeping current targets"),
                    }
                }
            }
        }
    });
}

#[cfg(not(unix))]
fn spawn_config_reload(_path: PathBuf, _updater: TargetUpdater, _shutdown: CancellationToken) {}
