//! Request envelopes for collector delivery.

use crate::Integration;
use serde::Serialize;
use std::collections::HashMap;

/// Telemetry wire-format version sent in every body and header.
pub const API_VERSION: &str = "v1";

const CONTENT_TYPE_HEADER: &str = "Content-Type";
const REQUEST_TYPE_HEADER: &str = "X-Telemetry-Request-Type";
const API_VERSION_HEADER: &str = "X-Telemetry-Api-Version";
const API_KEY_HEADER: &str = "X-Api-Key";

/// The three envelope kinds the reporter delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestType {
    AppStarted,
    AppClosed,
    AppIntegrationsChanged,
}

impl RequestType {
    /// Wire name, as used in the request-type header and body.
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestType::AppStarted => "app-started",
            RequestType::AppClosed => "app-closed",
            RequestType::AppIntegrationsChanged => "app-integrations-changed",
        }
    }
}

/// Identity block stamped into every request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Application {
    /// Service name of the instrumented application.
    pub service_name: String,
    /// Service version, when the application supplies one.
    pub service_version: Option<String>,
    /// Deployment environment (e.g. "production").
    pub env: Option<String>,
    /// Implementation language of the instrumented application.
    pub language_name: String,
    /// Language/toolchain version string.
    pub language_version: String,
    /// Version of this instrumentation library.
    pub library_version: String,
}

impl Application {
    /// Identity for a Rust application instrumented by this library version.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            service_version: None,
            env: None,
            language_name: "rust".to_string(),
            // The running toolchain is not introspectable at runtime; report
            // the minimum toolchain the library declares.
            language_version: env!("CARGO_PKG_RUST_VERSION").to_string(),
            library_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// One configuration entry reported in the `app-started` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigurationItem {
    pub name: String,
    pub value: String,
}

/// Payload of an `app-started` envelope.
///
/// The lists start empty; the startup-metadata collectors populate them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AppStartedPayload {
    pub integrations: Vec<Integration>,
    pub configuration: Vec<ConfigurationItem>,
}

/// Payload of an `app-integrations-changed` envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntegrationsChangedPayload {
    pub integrations: Vec<Integration>,
}

/// Request payload, one variant per [`RequestType`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    AppStarted(AppStartedPayload),
    /// `app-closed` carries an empty object.
    AppClosed {},
    IntegrationsChanged(IntegrationsChangedPayload),
}

/// Serializable body of one telemetry request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestBody {
    pub api_version: String,
    /// Delivery sequence number, stamped immediately before transmission.
    pub seq_id: u64,
    pub request_type: RequestType,
    /// Identifies this process instance across all its requests.
    pub runtime_id: String,
    /// Unix seconds at envelope build time.
    pub tracer_time: i64,
    pub application: Application,
    pub payload: Payload,
}

/// Per-process identity shared by all envelopes the reporter builds.
#[derive(Debug, Clone)]
pub struct ReporterIdentity {
    pub application: Application,
    /// Fresh per process instance; a forked child gets a new one.
    pub runtime_id: String,
    /// Collector API key, forwarded as a header when configured.
    pub api_key: Option<String>,
}

impl ReporterIdentity {
    pub fn new(application: Application, api_key: Option<String>) -> Self {
        Self {
            application,
            runtime_id: uuid::Uuid::new_v4().to_string(),
            api_key,
        }
    }

    fn headers(&self, request_type: RequestType) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        headers.insert(CONTENT_TYPE_HEADER.to_string(), "application/json".to_string());
        headers.insert(
            REQUEST_TYPE_HEADER.to_string(),
            request_type.as_str().to_string(),
        );
        headers.insert(API_VERSION_HEADER.to_string(), API_VERSION.to_string());
        if let Some(key) = &self.api_key {
            headers.insert(API_KEY_HEADER.to_string(), key.clone());
        }
        headers
    }
}

/// One unit of telemetry awaiting delivery: a serializable body plus the
/// transport headers to send it with.
///
/// Once an envelope has been placed in the delivery queue, only `seq_id` is
/// ever mutated (via [`TelemetryRequest::stamp_seq_id`], at send time).
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryRequest {
    pub body: RequestBody,
    pub headers: HashMap<String, String>,
}

impl TelemetryRequest {
    fn build(identity: &ReporterIdentity, request_type: RequestType, payload: Payload) -> Self {
        Self {
            body: RequestBody {
                api_version: API_VERSION.to_string(),
                seq_id: 0,
                request_type,
                runtime_id: identity.runtime_id.clone(),
                tracer_time: chrono::Utc::now().timestamp(),
                application: identity.application.clone(),
                payload,
            },
            headers: identity.headers(request_type),
        }
    }

    /// Build an `app-started` envelope with empty payload lists.
    pub fn app_started(identity: &ReporterIdentity) -> Self {
        Self::build(
            identity,
            RequestType::AppStarted,
            Payload::AppStarted(AppStartedPayload::default()),
        )
    }

    /// Build the `app-closed` envelope delivered at shutdown.
    pub fn app_closed(identity: &ReporterIdentity) -> Self {
        Self::build(identity, RequestType::AppClosed, Payload::AppClosed {})
    }

    /// Build an `app-integrations-changed` envelope carrying `integrations`.
    pub fn integrations_changed(
        identity: &ReporterIdentity,
        integrations: Vec<Integration>,
    ) -> Self {
        Self::build(
            identity,
            RequestType::AppIntegrationsChanged,
            Payload::IntegrationsChanged(IntegrationsChangedPayload { integrations }),
        )
    }

    /// Append an integration event to an `app-integrations-changed` envelope.
    ///
    /// Returns `false` (and leaves the envelope untouched) for any other
    /// envelope kind.
    pub fn push_integration(&mut self, integration: Integration) -> bool {
        match &mut self.body.payload {
            Payload::IntegrationsChanged(payload) => {
                payload.integrations.push(integration);
                true
            }
            _ => false,
        }
    }

    /// Stamp the delivery sequence number. Called once per send attempt.
    pub fn stamp_seq_id(&mut self, seq_id: u64) {
        self.body.seq_id = seq_id;
    }

    /// Number of integration events carried, for diagnostics.
    pub fn integration_count(&self) -> usize {
        match &self.body.payload {
            Payload::IntegrationsChanged(payload) => payload.integrations.len(),
            Payload::AppStarted(payload) => payload.integrations.len(),
            Payload::AppClosed {} => 0,
        }
    }
}
