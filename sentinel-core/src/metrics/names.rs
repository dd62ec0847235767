//! Stable metric and label names.

/// Gauge, 1 when the target is up.
pub const TARGET_UP: &str = "target_up";
/// Gauge, last observed HTTP status (0 if unreachable).
pub const TARGET_STATUS_CODE: &str = "target_status_code";
/// Gauge, last observed round-trip time in seconds.
pub const TARGET_LATENCY_SECONDS: &str = "target_latency_seconds";
/// Counter of liveness checks by result.
pub const CHECKS_TOTAL: &str = "checks_total";
/// Gauge, 1 when plaintext traffic redirects to HTTPS.
pub const TLS_REDIRECT: &str = "tls_redirect";
/// Gauge, signed seconds until the leaf certificate expires.
pub const TLS_CERT_EXPIRY_SECONDS: &str = "tls_cert_expiry_seconds";
/// Gauge, 1 when the leaf certificate is time-valid and matches the host.
pub const TLS_CERT_VALID: &str = "tls_cert_valid";

/// Label carrying the target host.
pub const LABEL_HOST: &str = "host";
/// Label carrying the target URL.
pub const LABEL_URL: &str = "url";
/// Label carrying `success` or `failure`.
pub const LABEL_RESULT: &str = "result";

/// `result` label value for an up check.
pub const RESULT_SUCCESS: &str = "success";
/// `result` label value for a down check.
pub const RESULT_FAILURE: &str = "failure";
