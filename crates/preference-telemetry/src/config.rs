//! Telemetry configuration from environment variables.

use std::env;

use crate::TelemetryError;

/// Configuration for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name recorded in the startup event
    pub service_name: String,

    /// `EnvFilter` directive (trace, debug, info, warn, error, or per-target)
    pub log_level: String,

    /// Emit JSON lines instead of human readable output
    pub json_logs: bool,

    /// Include file and line in JSON output
    pub with_source_location: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "preference-service".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            with_source_location: true,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from the process environment.
    ///
    /// - `PREF_SERVICE_NAME`: service name (default: preference-service)
    /// - `PREF_LOG_LEVEL` or `RUST_LOG`: filter (default: info)
    /// - `PREF_JSON_LOGS`: `true`/`1` for JSON (default: false)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Create configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            service_name: lookup("PREF_SERVICE_NAME").unwrap_or(defaults.service_name),
            log_level: lookup("PREF_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or(defaults.log_level),
            json_logs: lookup("PREF_JSON_LOGS")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.json_logs),
            with_source_location: defaults.with_source_location,
        }
    }

    /// Reject empty filter directives.
    pub fn validate(&self) -> Result<(), TelemetryError> {
        if self.log_level.trim().is_empty() {
            return Err(TelemetryError::Config("log level cannot be empty".into()));
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}
