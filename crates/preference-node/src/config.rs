//! Node configuration loaded from `PREF_*` environment variables.

use std::env;
use std::net::IpAddr;

use preference_gateway::GatewayConfig;
use preference_telemetry::TelemetryConfig;
use thiserror::Error;

/// Default database URL: a SQLite file next to the binary, created on first use.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://preferences.db?mode=rwc";

/// Complete node configuration.
#[derive(Debug, Clone, Default)]
pub struct NodeConfig {
    /// HTTP gateway configuration.
    pub gateway: GatewayConfig,
    /// Store configuration.
    pub database: DatabaseConfig,
    /// Logging configuration.
    pub telemetry: TelemetryConfig,
}

/// Store configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// `postgres://...`, `sqlite:...` or `memory`.
    pub url: String,
    /// Pool size for SQL backends.
    pub max_connections: u32,
    /// Scopes every row this node reads or writes.
    pub deployment_id: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: 10,
            deployment_id: "default".to_string(),
        }
    }
}

/// Which store implementation a database URL selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Memory,
    Postgres,
    Sqlite,
}

impl DatabaseConfig {
    /// Backend selected by the URL scheme.
    pub fn backend(&self) -> Result<Backend, ConfigError> {
        let url = self.url.trim();
        if url.eq_ignore_ascii_case("memory") {
            Ok(Backend::Memory)
        } else if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Ok(Backend::Postgres)
        } else if url.starts_with("sqlite:") {
            Ok(Backend::Sqlite)
        } else {
            Err(ConfigError::UnsupportedDatabase(redact(url)))
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.deployment_id.trim().is_empty() {
            return Err(ConfigError::EmptyDeploymentId);
        }
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                name: "PREF_DATABASE_MAX_CONNECTIONS",
                value: "0".to_string(),
            });
        }
        self.backend().map(|_| ())
    }
}

impl NodeConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    ///
    /// Unset variables keep their defaults; set but unparsable ones are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self {
            telemetry: TelemetryConfig::from_lookup(&lookup),
            ..Self::default()
        };

        if let Some(host) = lookup("PREF_HTTP_HOST") {
            config.gateway.http.host = parse::<IpAddr>("PREF_HTTP_HOST", &host)?;
        }
        if let Some(port) = lookup("PREF_HTTP_PORT") {
            config.gateway.http.port = parse("PREF_HTTP_PORT", &port)?;
        }
        if let Some(header) = lookup("PREF_USER_ID_HEADER") {
            config.gateway.identity.user_id_header = header;
        }
        if let Some(origins) = lookup("PREF_CORS_ORIGINS") {
            config.gateway.cors.allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(limit) = lookup("PREF_MAX_BODY_BYTES") {
            config.gateway.limits.max_body_bytes = parse("PREF_MAX_BODY_BYTES", &limit)?;
        }

        if let Some(url) = lookup("PREF_DATABASE_URL") {
            config.database.url = url;
        }
        if let Some(max) = lookup("PREF_DATABASE_MAX_CONNECTIONS") {
            config.database.max_connections = parse("PREF_DATABASE_MAX_CONNECTIONS", &max)?;
        }
        if let Some(deployment) = lookup("PREF_DEPLOYMENT_ID") {
            config.database.deployment_id = deployment;
        }

        Ok(config)
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.gateway
            .validate()
            .map_err(|e| ConfigError::Gateway(e.to_string()))?;
        self.database.validate()?;
        self.telemetry
            .validate()
            .map_err(|e| ConfigError::Telemetry(e.to_string()))
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{name}: cannot parse {value:?}")]
    InvalidValue { name: &'static str, value: String },

    #[error("deployment id must not be empty")]
    EmptyDeploymentId,

    #[error("unsupported database url: {0}")]
    UnsupportedDatabase(String),

    #[error("gateway: {0}")]
    Gateway(String),

    #[error("telemetry: {0}")]
    Telemetry(String),
}

fn parse<T: std::str::FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name,
        value: raw.to_string(),
    })
}

/// Scheme only; URLs may carry credentials.
fn redact(url: &str) -> String {
    match url.split_once(':') {
        Some((scheme, _)) => format!("{scheme}:..."),
        None => "<no scheme>".to_string(),
    }
}
