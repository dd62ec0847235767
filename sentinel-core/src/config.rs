//! YAML configuration for the Sentinel binary.
//!
//! ```yaml
//! interval: 5m
//! timeout: 10s
//! metrics_addr: ":9090"
//! targets:
//!   - https://good.example/
//!   - http://10.0.0.7:8080/healthz
//! ```

use serde::Deserialize;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::target::Target;
use crate::error::ConfigError;

const DEFAULT_INTERVAL: Duration = Duration::from_secs(5 * 60);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_METRICS_ADDR: &str = ":9090";

/// User agent sent by the liveness and redirect probes.
pub const DEFAULT_USER_AGENT: &str = "sentinel-health-checker/1.0";

/// Validated runtime configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Time between the start of two probe cycles.
    pub interval: Duration,
    /// Per-probe network timeout.
    pub timeout: Duration,
    /// Address the scrape server binds.
    pub metrics_addr: SocketAddr,
    /// Statically configured targets.
    pub targets: Vec<Target>,
    /// Extra PEM roots trusted by the liveness client.
    pub ca_file: Option<PathBuf>,
    /// User agent for outgoing probe requests.
    pub user_agent: String,
    /// Port the redirect probe connects to.
    pub http_port: u16,
    /// Port the certificate probe connects to.
    pub https_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
            metrics_addr: SocketAddr::from(([0, 0, 0, 0], 9090)),
            targets: Vec::new(),
            ca_file: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            http_port: 80,
            https_port: 443,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawConfig {
    interval: Option<String>,
    timeout: Option<String>,
    metrics_addr: Option<String>,
    targets: Vec<String>,
    ca_file: Option<PathBuf>,
    user_agent: Option<String>,
    http_port: Option<u16>,
    https_port: Option<u16>,
}

impl Config {
    /// Read and validate the configuration file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&data)
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml(data: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = if data.trim().is_empty() {
            RawConfig::default()
        } else {
            serde_yaml::from_str(data)?
        };

        let defaults = Config::default();

        let interval = match raw.interval.as_deref() {
            Some(value) if !value.trim().is_empty() => parse_duration("interval", value)?,
            _ => defaults.interval,
        };
        let timeout = match raw.timeout.as_deref() {
            Some(value) if !value.trim().is_empty() => parse_duration("timeout", value)?,
            _ => defaults.timeout,
        };
        let metrics_addr = parse_listen_addr(
            raw.metrics_addr
                .as_deref()
                .filter(|a| !a.trim().is_empty())
                .unwrap_or(DEFAULT_METRICS_ADDR),
        )?;

        let targets = raw
            .targets
            .iter()
            .enumerate()
            .map(|(index, url)| {
                Target::from_url(url.trim()).map_err(|source| ConfigError::InvalidTarget { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            interval,
            timeout,
            metrics_addr,
            targets,
            ca_file: raw.ca_file,
            user_agent: raw.user_agent.unwrap_or(defaults.user_agent),
            http_port: raw.http_port.unwrap_or(defaults.http_port),
            https_port: raw.https_port.unwrap_or(defaults.https_port),
        })
    }
}

fn parse_duration(field: &'static str, value: &str) -> Result<Duration, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidDuration {
        field,
        value: value.to_string(),
        reason,
    };

    let duration = humantime::parse_duration(value.trim()).map_err(|e| invalid(e.to_string()))?;
    if duration.is_zero() {
        return Err(invalid("must be greater than zero".to_string()));
    }
    Ok(duration)
}

/// Accepts `ip:port`, `hostname:port` or a bare `:port`, which binds every
/// interface. Hostnames are resolved once, at load time; the first address wins.
fn parse_listen_addr(value: &str) -> Result<SocketAddr, ConfigError> {
    let value = value.trim();
    let candidate = if value.starts_with(':') {
        format!("0.0.0.0{value}")
    } else {
        value.to_string()
    };
    if let Ok(addr) = candidate.parse() {
        return Ok(addr);
    }
    candidate
        .to_socket_addrs()
        .ok()
        .and_then(|mut addrs| addrs.next())
        .ok_or_else(|| ConfigError::InvalidAddress(value.to_string()))
}
