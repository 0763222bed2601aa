//! Reporter configuration.

use crate::{TelemetryError, TelemetryResult};
use std::time::Duration;
use url::Url;

/// Seconds between flush cycles when the environment does not override it.
pub const DEFAULT_FLUSH_INTERVAL_SECS: u64 = 60;

/// Environment variable overriding the flush interval, in seconds.
pub const INTERVAL_ENV: &str = "INSTRUMENTATION_TELEMETRY_INTERVAL";

/// Default timeout for one delivery round-trip.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Configuration for the telemetry reporter.
#[derive(Debug, Clone)]
pub struct ReporterConfig {
    /// Collector endpoint URL, supplied at enable time.
    pub endpoint: String,
    /// Interval between flush cycles. Read once at construction.
    pub flush_interval: Duration,
    /// Collector API key, forwarded as a request header when set.
    pub api_key: Option<String>,
    /// Timeout enforced by the transport on each delivery round-trip.
    pub request_timeout: Duration,
}

impl ReporterConfig {
    /// Build a configuration for `endpoint`, reading the flush interval from
    /// the environment.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            flush_interval: flush_interval_from_env(),
            api_key: None,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    /// Attach a collector API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Override the flush interval explicitly (tests, embedders with their
    /// own configuration surface).
    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }

    /// Get the endpoint as a parsed URL.
    pub fn endpoint_url(&self) -> TelemetryResult<Url> {
        Url::parse(&self.endpoint).map_err(TelemetryError::from)
    }
}

/// Flush interval from `INSTRUMENTATION_TELEMETRY_INTERVAL`, falling back to
/// [`DEFAULT_FLUSH_INTERVAL_SECS`]. Zero and unparseable values fall back too.
fn flush_interval_from_env() -> Duration {
    let secs = std::env::var(INTERVAL_ENV)
        .ok()
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_FLUSH_INTERVAL_SECS);
    Duration::from_secs(secs)
}
