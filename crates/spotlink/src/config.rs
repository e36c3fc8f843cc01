//! File-based configuration.

use std::path::Path;

use serde::Deserialize;
use spotlink_session::ServiceConfig;

use crate::SpotlinkError;

/// Top-level configuration, usually loaded from a JSON file.
///
/// Every field has a default, so `{}` is a valid configuration:
///
/// ```json
/// {
///   "service": {
///     "reconnect": { "min_delay_ms": 500, "max_delay_ms": 30000 },
///     "exchange": { "request_timeout_ms": 5000 }
///   },
///   "log_filter": "spotlink=debug,info"
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpotlinkConfig {
    /// Settings for the remote control service.
    pub service: ServiceConfig,

    /// Default `tracing` filter; `RUST_LOG` overrides it.
    pub log_filter: String,
}

impl Default for SpotlinkConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            log_filter: "info".to_string(),
        }
    }
}

impl SpotlinkConfig {
    /// Parses a configuration from JSON text.
    ///
    /// # Errors
    /// [`SpotlinkError::Config`] if the text is not a valid configuration.
    pub fn from_json_str(json: &str) -> Result<Self, SpotlinkError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a configuration file.
    ///
    /// # Errors
    /// [`SpotlinkError::Io`] if the file cannot be read,
    /// [`SpotlinkError::Config`] if it does not parse.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SpotlinkError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_str_empty_object_is_default() {
        let config = SpotlinkConfig::from_json_str("{}").unwrap();
        assert_eq!(config.log_filter, "info");
        assert_eq!(config.service.reconnect.base_delay_ms, 1_000);
        assert_eq!(config.service.exchange.request_timeout_ms, 5_000);
    }

    #[test]
    fn test_from_json_str_overrides_nested_fields() {
        let config = SpotlinkConfig::from_json_str(
            r#"{
                "service": {
                    "reconnect": { "factor": 3.0 },
                    "exchange": { "request_timeout_ms": 1500 },
                    "event_capacity": 8
                },
                "log_filter": "spotlink=debug"
            }"#,
        )
        .unwrap();

        assert_eq!(config.service.reconnect.factor, 3.0);
        assert_eq!(config.service.reconnect.max_delay_ms, 30_000);
        assert_eq!(config.service.exchange.request_timeout_ms, 1_500);
        assert_eq!(config.service.event_capacity, 8);
        assert_eq!(config.log_filter, "spotlink=debug");
    }

    #[test]
    fn test_from_json_str_malformed_is_config_error() {
        let result = SpotlinkConfig::from_json_str("{ service: ");
        assert!(matches!(result, Err(SpotlinkError::Config(_))));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let result = SpotlinkConfig::load("/definitely/not/here/spotlink.json");
        assert!(matches!(result, Err(SpotlinkError::Io(_))));
    }

    #[test]
    fn test_load_reads_file() {
        let path = std::env::temp_dir().join(format!(
            "spotlink-config-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, r#"{ "log_filter": "warn" }"#).unwrap();

        let config = SpotlinkConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.log_filter, "warn");
    }
}
