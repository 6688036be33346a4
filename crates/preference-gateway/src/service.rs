//! Gateway service - binds the HTTP listener and serves the router until shutdown.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use preference_service::PreferenceApi;
use preference_telemetry::PreferenceMetrics;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::domain::config::GatewayConfig;
use crate::domain::error::GatewayError;
use crate::router::{build_router, AppState};

/// HTTP gateway in front of a [`PreferenceApi`].
pub struct PreferenceGateway {
    config: GatewayConfig,
    router: Router,
    metrics: PreferenceMetrics,
}

impl PreferenceGateway {
    /// Validate the configuration and build the router.
    pub fn new(
        config: GatewayConfig,
        api: Arc<dyn PreferenceApi>,
        metrics: PreferenceMetrics,
    ) -> Result<Self, GatewayError> {
        config
            .validate()
            .map_err(|e| GatewayError::Config(e.to_string()))?;

        let state = AppState::new(api, metrics.clone());
        let router =
            build_router(state, &config).map_err(|e| GatewayError::Config(e.to_string()))?;

        Ok(Self {
            config,
            router,
            metrics,
        })
    }

    /// Router with the full middleware stack, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn metrics(&self) -> &PreferenceMetrics {
        &self.metrics
    }

    /// Configured listen address.
    pub fn http_addr(&self) -> SocketAddr {
        self.config.http_addr()
    }

    /// Bind the configured address and serve until `shutdown` resolves.
    pub async fn serve_with_shutdown<F>(self, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.http_addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| GatewayError::Bind(format!("{addr}: {e}")))?;
        self.serve_on(listener, shutdown).await
    }

    /// Serve on an already bound listener.
    pub async fn serve_on<F>(self, listener: TcpListener, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local = listener
            .local_addr()
            .map_err(|e| GatewayError::Bind(e.to_string()))?;
        info!(addr = %local, "Starting HTTP server");

        let result = axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await;

        match result {
            Ok(()) => {
                info!("HTTP server stopped");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "HTTP server error");
                Err(GatewayError::Serve(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use preference_service::adapters::{InMemoryPreferenceStore, InMemoryTransactioner};
    use preference_service::PreferenceService;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::sync::oneshot;

    fn api() -> Arc<dyn PreferenceApi> {
        let store = InMemoryPreferenceStore::new("default");
        let transactioner = InMemoryTransactioner::new(&store);
        Arc::new(PreferenceService::new(store, transactioner))
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = GatewayConfig::default();
        config.http.port = 0;
        let result = PreferenceGateway::new(config, api(), PreferenceMetrics::new().unwrap());
        assert!(matches!(result, Err(GatewayError::Config(_))));
    }

    #[test]
    fn test_invalid_identity_header_is_rejected() {
        let mut config = GatewayConfig::default();
        config.identity.user_id_header = "bad header".into();
        let result = PreferenceGateway::new(config, api(), PreferenceMetrics::new().unwrap());
        assert!(matches!(result, Err(GatewayError::Config(_))));
    }

    #[tokio::test]
    async fn test_serves_until_shutdown() {
        let gateway = PreferenceGateway::new(
            GatewayConfig::default(),
            api(),
            PreferenceMetrics::new().unwrap(),
        )
        .unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        let server = tokio::spawn(gateway.serve_on(listener, async {
            let _ = rx.await;
        }));

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains("\"status\":\"ok\""));

        tx.send(()).unwrap();
        server.await.unwrap().unwrap();
    }
}
