//! Telemetry event payloads and request envelopes.
//!
//! This crate provides:
//! - [`Integration`]: a record that one instrumented dependency was detected
//! - [`TelemetryRequest`]: one unit of telemetry (body + transport headers)
//!   awaiting delivery to the collector
//! - Builders for the three envelope kinds the reporter delivers:
//!   `app-started`, `app-closed`, `app-integrations-changed`
//!
//! No I/O happens here; the `telemetry-reporter` crate owns queuing and
//! delivery.

mod integration;
mod request;

pub use integration::Integration;
pub use request::{
    AppStartedPayload, Application, ConfigurationItem, IntegrationsChangedPayload, Payload,
    ReporterIdentity, RequestBody, RequestType, TelemetryRequest, API_VERSION,
};
