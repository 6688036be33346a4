//! # Preference Telemetry
//!
//! Logging and metrics setup shared by the gateway and the node binary.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use preference_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_telemetry(&config)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `PREF_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter directive |
//! | `PREF_JSON_LOGS` | `false` | Emit JSON lines instead of pretty logs |
//! | `PREF_SERVICE_NAME` | `preference-service` | Service name recorded at startup |

mod config;
mod logging;
mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{InFlightGuard, PreferenceMetrics};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<prometheus::Error> for TelemetryError {
    fn from(err: prometheus::Error) -> Self {
        TelemetryError::MetricsInit(err.to_string())
    }
}

/// Install the global tracing subscriber described by `config`.
///
/// Fails if a global subscriber is already installed.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    init_logging(config)?;

    tracing::info!(
        service = %config.service_name,
        log_level = %config.log_level,
        json_logs = config.json_logs,
        "telemetry initialized"
    );
    Ok(())
}
