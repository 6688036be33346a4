//! Gateway configuration with validation.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use axum::http::HeaderName;
use serde::{Deserialize, Serialize};

/// Main gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// HTTP server configuration
    pub http: HttpConfig,
    /// Caller identity configuration
    pub identity: IdentityConfig,
    /// Request limits
    pub limits: LimitsConfig,
    /// CORS configuration
    pub cors: CorsConfig,
}

impl GatewayConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.port == 0 {
            return Err(ConfigError::InvalidPort);
        }

        if self.identity.user_id_header.trim().is_empty() {
            return Err(ConfigError::InvalidHeader(
                "user id header cannot be empty".into(),
            ));
        }
        self.identity.header_name()?;

        if self.limits.max_body_bytes == 0 {
            return Err(ConfigError::InvalidLimit(
                "max_body_bytes cannot be 0".into(),
            ));
        }

        if self.cors.enabled && self.cors.allowed_origins.is_empty() {
            return Err(ConfigError::Invalid(
                "CORS enabled with no allowed origins".into(),
            ));
        }

        Ok(())
    }

    /// Get HTTP server bind address
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.http.host, self.http.port)
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind address
    pub host: IpAddr,
    /// Port (default: 8090)
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 8090,
        }
    }
}

/// Where the authenticated user id comes from.
///
/// The header is set by the upstream authentication layer and trusted as is.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub user_id_header: String,
}

impl IdentityConfig {
    /// Parsed header name.
    pub fn header_name(&self) -> Result<HeaderName, ConfigError> {
        HeaderName::try_from(self.user_id_header.trim().to_ascii_lowercase())
            .map_err(|e| ConfigError::InvalidHeader(e.to_string()))
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            user_id_header: "x-user-id".to_string(),
        }
    }
}

/// Request limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum request body size in bytes
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Enable CORS handling
    pub enabled: bool,
    /// Allowed origins; `*` reflects the request origin
    pub allowed_origins: Vec<String>,
    /// Allowed methods
    pub allowed_methods: Vec<String>,
    /// Allowed request headers
    pub allowed_headers: Vec<String>,
    /// Preflight cache duration in seconds
    pub max_age: u64,
    /// Allow cookies and authorization headers
    pub allow_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: vec!["*".to_string()],
            allowed_methods: vec![
                "GET".to_string(),
                "PUT".to_string(),
                "DELETE".to_string(),
                "OPTIONS".to_string(),
            ],
            allowed_headers: vec!["Content-Type".to_string(), "Authorization".to_string()],
            max_age: 3600,
            allow_credentials: true,
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Port 0 is not a usable listen port
    #[error("invalid port: 0")]
    InvalidPort,
    /// Identity header missing or not a valid header name
    #[error("invalid identity header: {0}")]
    InvalidHeader(String),
    /// Invalid size limit
    #[error("invalid limit: {0}")]
    InvalidLimit(String),
    /// General configuration error
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = GatewayConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.http_addr().port(), 8090);
        assert_eq!(config.identity.user_id_header, "x-user-id");
        assert_eq!(config.limits.max_body_bytes, 1_048_576);
    }

    #[test]
    fn test_port_zero_rejected() {
        let mut config = GatewayConfig::default();
        config.http.port = 0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidPort));
    }

    #[test]
    fn test_identity_header_validation() {
        let mut config = GatewayConfig::default();
        config.identity.user_id_header = "   ".into();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidHeader(_))));

        config.identity.user_id_header = "bad header".into();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidHeader(_))));

        config.identity.user_id_header = "X-Authenticated-User".into();
        assert!(config.validate().is_ok());
        assert_eq!(
            config.identity.header_name().unwrap().as_str(),
            "x-authenticated-user"
        );
    }

    #[test]
    fn test_zero_body_limit_rejected() {
        let mut config = GatewayConfig::default();
        config.limits.max_body_bytes = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidLimit(_))));
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: GatewayConfig =
            serde_json::from_str(r#"{"http":{"port":9000},"cors":{"enabled":false}}"#).unwrap();
        assert_eq!(config.http.port, 9000);
        assert!(!config.cors.enabled);
        assert_eq!(config.identity.user_id_header, "x-user-id");
    }
}
