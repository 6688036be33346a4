//! # HTTP Flows
//!
//! Requests through the router built by the node's wiring, backed by an
//! in-memory SQLite database.

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use axum::Router;
    use preference_gateway::{GatewayConfig, PreferenceGateway};
    use preference_node::{build_service, DatabaseConfig};
    use preference_telemetry::PreferenceMetrics;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    // =============================================================================
    // FIXTURES
    // =============================================================================

    async fn app_for(deployment: &str) -> Router {
        let db = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            deployment_id: deployment.to_string(),
            ..DatabaseConfig::default()
        };
        let api = build_service(&db).await.unwrap();
        PreferenceGateway::new(GatewayConfig::default(), api, PreferenceMetrics::new().unwrap())
            .unwrap()
            .router()
    }

    async fn call(
        app: &Router,
        method: Method,
        uri: &str,
        user: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header("x-user-id", user);
        }
        let body = match body {
            Some(v) => {
                builder = builder.header("content-type", "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };

        let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    // =============================================================================
    // FLOWS
    // =============================================================================

    #[tokio::test]
    async fn test_full_preference_lifecycle() {
        let app = app_for("default").await;

        let (status, _) = call(
            &app,
            Method::PUT,
            "/users/me/preferences",
            Some("alice"),
            Some(json!({"preferences": {"theme": "dark", "locale": "en"}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) =
            call(&app, Method::GET, "/users/me/preferences", Some("alice"), None).await;
        assert_eq!(status, StatusCode::OK);
        let prefs = body["preferences"].as_array().unwrap();
        assert_eq!(prefs.len(), 2);
        assert_eq!(prefs[0]["key"], "locale");
        assert_eq!(prefs[1]["key"], "theme");
        assert!(prefs[0]["created_at"].is_string());

        let (status, _) = call(
            &app,
            Method::PUT,
            "/users/me/preferences",
            Some("alice"),
            Some(json!({"preferences": {"theme": "light"}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) =
            call(&app, Method::GET, "/users/me/preferences/theme", Some("alice"), None).await;
        assert_eq!(body, json!({"key": "theme", "value": "light"}));

        let (status, _) =
            call(&app, Method::DELETE, "/users/me/preferences/theme", Some("alice"), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) =
            call(&app, Method::GET, "/users/me/preferences/theme", Some("alice"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "PREF-4001");
    }

    #[tokio::test]
    async fn test_callers_only_see_their_own_rows() {
        let app = app_for("default").await;

        call(
            &app,
            Method::PUT,
            "/users/me/preferences",
            Some("alice"),
            Some(json!({"preferences": {"theme": "dark"}})),
        )
        .await;

        let (status, body) =
            call(&app, Method::GET, "/users/me/preferences", Some("bob"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"preferences": []}));

        let (status, _) =
            call(&app, Method::DELETE, "/users/me/preferences/theme", Some("bob"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_error_contract() {
        let app = app_for("default").await;

        let (status, body) = call(&app, Method::GET, "/users/me/preferences", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "PREF-4000");
        assert_eq!(body["description"], "User authentication is required");

        let (status, body) = call(
            &app,
            Method::PUT,
            "/users/me/preferences",
            Some("alice"),
            Some(json!({"preferences": {}})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "PREF-4004");

        let (status, body) = call(
            &app,
            Method::PUT,
            "/users/me/preferences",
            Some("alice"),
            Some(json!({"preferences": {"   ": "x"}})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "PREF-4002");
    }
}
