//! Liveness probe: GET the target URL and classify the response.

use reqwest::Client;
use std::time::Instant;
use tracing::{info, warn};

use sentinel_core::{Observation, Target};

/// Status codes in `[200, 500)` mean the endpoint answered; anything else is down.
pub fn is_up(status_code: u16) -> bool {
    (200..500).contains(&status_code)
}

/// Issue one GET against `target.url()` and classify the result.
///
/// Transport, DNS and timeout failures are reported as down with status code 0.
pub async fn check(client: &Client, target: &Target) -> Observation {
    let start = Instant::now();
    let result = client.get(target.url()).send().await;
    let latency = start.elapsed();

    let response = match result {
        Ok(response) => response,
        Err(err) => {
            warn!(host = target.host(), url = target.url(), error = %err, "target unreachable");
            return Observation::Liveness {
                up: false,
                status_code: 0,
                latency,
            };
        }
    };

    let status_code = response.status().as_u16();
    let up = is_up(status_code);
    let latency_ms = latency.as_millis() as u64;

    if up {
        info!(host = target.host(), status = status_code, latency_ms, "target up");
    } else {
        warn!(host = target.host(), status = status_code, latency_ms, "target returned error");
    }

    Observation::Liveness {
        up,
        status_code,
        latency,
    }
}
