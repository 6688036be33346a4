//! CORS layer built from gateway configuration.

use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::domain::config::CorsConfig;

/// Create CORS layer from gateway config.
///
/// `*` in the origin list reflects the request origin when credentials are
/// allowed, since browsers reject a literal wildcard together with
/// credentials.
pub fn create_cors_layer(config: &CorsConfig) -> CorsLayer {
    if !config.enabled {
        return CorsLayer::new();
    }

    let mut cors = CorsLayer::new();

    // Origins
    let wildcard = config.allowed_origins.iter().any(|o| o == "*");
    cors = match (wildcard, config.allow_credentials) {
        (true, true) => cors.allow_origin(AllowOrigin::mirror_request()),
        (true, false) => cors.allow_origin(Any),
        (false, _) => {
            let origins: Vec<HeaderValue> = config
                .allowed_origins
                .iter()
                .filter_map(|o| o.parse().ok())
                .collect();
            cors.allow_origin(origins)
        }
    };

    // Methods
    let methods: Vec<Method> = config
        .allowed_methods
        .iter()
        .filter_map(|m| m.parse().ok())
        .collect();
    cors = cors.allow_methods(methods);

    // Headers
    let headers: Vec<HeaderName> = config
        .allowed_headers
        .iter()
        .filter_map(|h| h.parse().ok())
        .collect();
    cors = cors.allow_headers(headers);

    cors = cors.max_age(Duration::from_secs(config.max_age));

    if config.allow_credentials {
        cors = cors.allow_credentials(true);
    }

    cors
}
