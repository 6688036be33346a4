//! # Preference Node
//!
//! Runtime for the preference service.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration from `PREF_*` environment variables
//! 2. Install the tracing subscriber
//! 3. Open the configured store and create the table if missing
//! 4. Wire the service into the HTTP gateway
//! 5. Serve until Ctrl+C, then drain in-flight requests

pub mod config;
pub mod wiring;

use std::future::Future;

use preference_gateway::{GatewayError, PreferenceGateway};
use preference_service::StoreError;
use preference_telemetry::{PreferenceMetrics, TelemetryError};
use thiserror::Error;
use tracing::info;

pub use config::{Backend, ConfigError, DatabaseConfig, NodeConfig};
pub use wiring::build_service;

/// Startup and runtime failures.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("store: {0}")]
    Store(#[from] StoreError),

    #[error("telemetry: {0}")]
    Telemetry(#[from] TelemetryError),

    #[error("gateway: {0}")]
    Gateway(#[from] GatewayError),
}

/// A configured node, ready to serve.
pub struct PreferenceNode {
    gateway: PreferenceGateway,
}

impl PreferenceNode {
    /// Validate `config`, open the store and build the gateway.
    pub async fn build(config: NodeConfig) -> Result<Self, NodeError> {
        config.validate()?;

        let api = build_service(&config.database).await?;
        let metrics = PreferenceMetrics::new()?;
        let gateway = PreferenceGateway::new(config.gateway, api, metrics)?;

        Ok(Self { gateway })
    }

    pub fn gateway(&self) -> &PreferenceGateway {
        &self.gateway
    }

    /// Serve until `shutdown` resolves.
    pub async fn run<F>(self, shutdown: F) -> Result<(), NodeError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!(addr = %self.gateway.http_addr(), "Preference node starting");
        self.gateway.serve_with_shutdown(shutdown).await?;
        info!("Preference node stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_build_rejects_invalid_config() {
        let mut config = NodeConfig::default();
        config.database.deployment_id = String::new();
        let result = PreferenceNode::build(config).await;
        assert!(matches!(
            result,
            Err(NodeError::Config(ConfigError::EmptyDeploymentId))
        ));
    }

    #[tokio::test]
    async fn test_build_with_memory_store() {
        let mut config = NodeConfig::default();
        config.database.url = "memory".to_string();
        let node = PreferenceNode::build(config).await.unwrap();
        assert_eq!(node.gateway().http_addr().port(), 8090);
    }
}
