//! Probe target models.

use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::error::TargetError;

/// A single endpoint watched by the prober.
///
/// The `url` drives the liveness probe; the `host` drives the redirect and
/// certificate probes. Both are fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    url: String,
    host: String,
}

impl Target {
    /// Create a target from an explicit URL and host pair.
    ///
    /// The URL must be absolute with a scheme and host; the host must be non-empty.
    /// The host is not required to match the URL's host. Brackets around an
    /// IPv6 literal host are dropped, as `from_url` does.
    pub fn new(url: impl Into<String>, host: impl Into<String>) -> Result<Self, TargetError> {
        let url = url.into();
        let host: String = host.into();
        let host = unbracket(host.trim()).to_string();

        if host.is_empty() {
            return Err(TargetError::EmptyHost);
        }
        parse_absolute(&url)?;

        Ok(Self { url, host })
    }

    /// Build a target from a raw URL, deriving the host from it.
    pub fn from_url(raw: &str) -> Result<Self, TargetError> {
        let parsed = parse_absolute(raw)?;
        let host = hostname(&parsed).ok_or_else(|| TargetError::MissingSchemeOrHost(raw.to_string()))?;

        Ok(Self {
            url: raw.to_string(),
            host,
        })
    }

    /// The URL requested by the liveness probe.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The bare hostname used for the TLS probes.
    pub fn host(&self) -> &str {
        &self.host
    }
}

impl FromStr for Target {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_url(s)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.host, self.url)
    }
}

fn parse_absolute(raw: &str) -> Result<Url, TargetError> {
    let parsed = Url::parse(raw).map_err(|e| TargetError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    if parsed.scheme().is_empty() || hostname(&parsed).is_none() {
        return Err(TargetError::MissingSchemeOrHost(raw.to_string()));
    }

    Ok(parsed)
}

/// Host without the brackets `Url` keeps around IPv6 literals.
fn hostname(url: &Url) -> Option<String> {
    let host = unbracket(url.host_str()?);
    if host.is_empty() {
        None
    } else {
        Some(host.to_string())
    }
}

fn unbracket(host: &str) -> &str {
    host.trim_start_matches('[').trim_end_matches(']')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_is_derived_from_url() {
        let target = Target::from_url("https://good.example:8443/health?x=1").unwrap();
        assert_eq!(target.host(), "good.example");
        assert_eq!(target.url(), "https://good.example:8443/health?x=1");
    }

    #[test]
    fn ipv6_brackets_are_stripped() {
        let target: Target = "http://[::1]:8080/".parse().unwrap();
        assert_eq!(target.host(), "::1");
    }

    #[test]
    fn rejects_relative_and_hostless_urls() {
        assert!(matches!(
            Target::from_url("/just/a/path"),
            Err(TargetError::InvalidUrl { .. })
        ));
        assert!(matches!(
            Target::from_url("mailto:ops@example.com"),
            Err(TargetError::MissingSchemeOrHost(_))
        ));
    }

    #[test]
    fn explicit_ipv6_host_is_unbracketed() {
        let target = Target::new("http://[::1]:8080/", "[::1]").unwrap();
        assert_eq!(target.host(), "::1");
        assert_eq!(target, Target::from_url("http://[::1]:8080/").unwrap());
        assert_eq!(Target::new("https://good.example/", "[]"), Err(TargetError::EmptyHost));
    }

    #[test]
    fn rejects_empty_host() {
        assert_eq!(
            Target::new("https://good.example/", "  "),
            Err(TargetError::EmptyHost)
        );
    }
}
