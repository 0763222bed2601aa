//! Blocking HTTP delivery of one envelope at a time.

use crate::{ReporterConfig, TelemetryResult};
use std::time::{Duration, Instant};
use telemetry_events::TelemetryRequest;
use tracing::{debug, warn};

/// Status the collector returns for an accepted envelope.
const ACCEPTED_STATUS: u16 = 202;

/// Outcome of one delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The collector accepted the envelope.
    Accepted,
    /// The collector responded with a non-accepted status.
    Rejected(u16),
    /// The round-trip produced no response (connection refused, timeout,
    /// serialization failure).
    Unreachable,
}

impl SendOutcome {
    /// True only for a confirmed delivery; everything else is retried by the
    /// flush cycle.
    pub fn is_accepted(&self) -> bool {
        matches!(self, SendOutcome::Accepted)
    }
}

/// Performs one synchronous round-trip per envelope against the collector.
///
/// No retry happens here; the flush cycle decides what to do with failures.
pub struct DeliverySender {
    client: reqwest::blocking::Client,
    endpoint: String,
    /// Round-trips at or above this duration log at elevated severity: the
    /// delivery latency is competing with the next scheduled flush.
    flush_interval: Duration,
}

impl DeliverySender {
    /// Build a sender for the configured collector endpoint.
    pub fn new(config: &ReporterConfig) -> TelemetryResult<Self> {
        let endpoint = config.endpoint_url()?;
        let client = reqwest::blocking::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            flush_interval: config.flush_interval,
        })
    }

    /// Send one envelope and classify the outcome.
    ///
    /// Emits a diagnostic line on every attempt; the connection is released
    /// on every exit path (the response is dropped before returning).
    pub fn send(&self, request: &TelemetryRequest) -> SendOutcome {
        let body = match serde_json::to_vec(&request.body) {
            Ok(body) => body,
            Err(error) => {
                warn!(error = %error, "Failed to serialize telemetry body");
                return SendOutcome::Unreachable;
            }
        };
        let body_len = body.len();

        let mut builder = self.client.post(&self.endpoint).body(body);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let started = Instant::now();
        let response = builder.send();
        let elapsed = started.elapsed();

        match response {
            Ok(response) => {
                let status = response.status().as_u16();
                if elapsed >= self.flush_interval {
                    warn!(
                        bytes = body_len,
                        elapsed_ms = elapsed.as_millis() as u64,
                        endpoint = %self.endpoint,
                        status = status,
                        "Telemetry delivery slower than flush interval"
                    );
                } else {
                    debug!(
                        bytes = body_len,
                        elapsed_ms = elapsed.as_millis() as u64,
                        endpoint = %self.endpoint,
                        status = status,
                        "Sent telemetry request"
                    );
                }

                if status == ACCEPTED_STATUS {
                    SendOutcome::Accepted
                } else {
                    SendOutcome::Rejected(status)
                }
            }
            Err(error) => {
                warn!(
                    bytes = body_len,
                    elapsed_ms = elapsed.as_millis() as u64,
                    endpoint = %self.endpoint,
                    error = %error,
                    "Telemetry delivery failed"
                );
                SendOutcome::Unreachable
            }
        }
    }
}
