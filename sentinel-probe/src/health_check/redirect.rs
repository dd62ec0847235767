//! TLS redirect probe: does plaintext HTTP redirect to HTTPS?

use reqwest::header::LOCATION;
use reqwest::{Client, StatusCode};
use tracing::{debug, info, warn};

use sentinel_core::Observation;

const HTTPS_PREFIX: &str = "https://";

/// The plaintext URL probed for `host`.
pub fn redirect_url(host: &str, port: u16) -> String {
    let host = if host.contains(':') {
        format!("[{host}]")
    } else {
        host.to_string()
    };

    if port == 80 {
        format!("http://{host}/")
    } else {
        format!("http://{host}:{port}/")
    }
}

/// A 3xx whose `Location` starts with `https://`.
pub fn is_https_redirect(status: StatusCode, location: Option<&str>) -> bool {
    status.is_redirection() && location.is_some_and(|l| l.starts_with(HTTPS_PREFIX))
}

/// Request `http://<host>/` without following redirects.
///
/// `client` must be built with redirects disabled.
pub async fn check(client: &Client, host: &str, port: u16) -> Observation {
    let url = redirect_url(host, port);

    let response = match client.get(&url).send().await {
        Ok(response) => response,
        Err(err) => {
            debug!(host, error = %err, "tls redirect check failed");
            return Observation::TlsRedirect { enforced: false };
        }
    };

    let status = response.status();
    let location = response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok());

    let enforced = is_https_redirect(status, location);
    if enforced {
        info!(host, "tls redirect active");
    } else {
        warn!(host, status = status.as_u16(), location, "no tls redirect");
    }

    Observation::TlsRedirect { enforced }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_omits_default_port_and_brackets_ipv6() {
        assert_eq!(redirect_url("good.example", 80), "http://good.example/");
        assert_eq!(redirect_url("good.example", 8080), "http://good.example:8080/");
        assert_eq!(redirect_url("::1", 8080), "http://[::1]:8080/");
    }

    #[test]
    fn only_3xx_to_https_counts() {
        assert!(is_https_redirect(
            StatusCode::MOVED_PERMANENTLY,
            Some("https://example.com/")
        ));
        assert!(is_https_redirect(StatusCode::PERMANENT_REDIRECT, Some("https://x/")));
        assert!(!is_https_redirect(StatusCode::OK, Some("https://example.com/")));
        assert!(!is_https_redirect(StatusCode::FOUND, Some("http://example.com/")));
        assert!(!is_https_redirect(StatusCode::FOUND, Some("/login")));
        assert!(!is_https_redirect(StatusCode::MOVED_PERMANENTLY, None));
    }
}
