//! Integration activation events.

use serde::{Deserialize, Serialize};

/// A record that one instrumented dependency was detected and activated.
///
/// Produced by the integration-detection collaborators; the reporter batches
/// these into a single `app-integrations-changed` envelope per flush cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Integration {
    /// Name of the instrumented dependency (e.g. a database driver crate).
    pub name: String,
    /// Version of the dependency, when it could be determined.
    pub version: Option<String>,
    /// Whether the integration is currently enabled.
    pub enabled: bool,
    /// Whether the integration was enabled automatically rather than by the
    /// application.
    pub auto_enabled: bool,
    /// Whether the detected dependency version is supported. `None` when the
    /// check has not run.
    pub compatible: Option<bool>,
    /// Load error reported by the integration, if activation failed.
    pub error: Option<String>,
}

impl Integration {
    /// Create an enabled integration record with only a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            enabled: true,
            auto_enabled: false,
            compatible: None,
            error: None,
        }
    }

    /// Attach the detected dependency version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Record a load failure. A failed integration is reported as disabled.
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self.enabled = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_defaults_to_enabled() {
        let integration = Integration::new("sqlx");
        assert_eq!(integration.name, "sqlx");
        assert!(integration.enabled);
        assert!(!integration.auto_enabled);
        assert!(integration.version.is_none());
        assert!(integration.error.is_none());
    }

    #[test]
    fn with_error_disables() {
        let integration = Integration::new("redis").with_error("symbol not found");
        assert!(!integration.enabled);
        assert_eq!(integration.error.as_deref(), Some("symbol not found"));
    }

    #[test]
    fn serializes_all_fields() {
        let integration = Integration::new("reqwest").with_version("0.12.5");
        let value = serde_json::to_value(&integration).unwrap();
        assert_eq!(value["name"], "reqwest");
        assert_eq!(value["version"], "0.12.5");
        assert_eq!(value["enabled"], true);
        assert_eq!(value["compatible"], serde_json::Value::Null);
    }
}
