//! HTTP routes for the preference API.
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | GET | `/users/me/preferences` | list |
//! | PUT | `/users/me/preferences` | batch upsert |
//! | GET | `/users/me/preferences/:key` | get one |
//! | DELETE | `/users/me/preferences/:key` | delete one |
//! | GET | `/health` | liveness |
//! | GET | `/metrics` | Prometheus exposition |

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, PathRejection},
        Path, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};
use preference_service::{PreferenceApi, ServiceError};
use preference_telemetry::PreferenceMetrics;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::domain::config::{ConfigError, GatewayConfig};
use crate::domain::error::{ApiError, ApiResult};
use crate::domain::types::{
    HealthResponse, MessageResponse, PreferenceResponse, PreferencesResponse,
    UpsertPreferencesRequest, UpsertPreferencesResponse,
};
use crate::middleware::{
    body_limit_error_layer, body_limit_layer, create_cors_layer, AuthenticatedUser, IdentityLayer,
    MetricsLayer,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub api: Arc<dyn PreferenceApi>,
    pub metrics: PreferenceMetrics,
}

impl AppState {
    pub fn new(api: Arc<dyn PreferenceApi>, metrics: PreferenceMetrics) -> Self {
        Self { api, metrics }
    }
}

/// Build the full router with its middleware stack.
pub fn build_router(state: AppState, config: &GatewayConfig) -> Result<Router, ConfigError> {
    let identity = IdentityLayer::new(config.identity.header_name()?);

    let preferences = Router::new()
        .route(
            "/users/me/preferences",
            get(list_preferences).put(upsert_preferences),
        )
        .route(
            "/users/me/preferences/:key",
            get(get_preference).delete(delete_preference),
        )
        .route_layer(identity);

    let router = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(render_metrics))
        .merge(preferences)
        .layer(MetricsLayer::new(state.metrics.clone()))
        .layer(body_limit_layer(config.limits.max_body_bytes))
        .layer(body_limit_error_layer())
        .layer(create_cors_layer(&config.cors))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(router)
}

async fn list_preferences(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> ApiResult<Json<PreferencesResponse>> {
    let preferences = state.api.get_preferences_by_user_id(user.id()).await?;
    Ok(Json(PreferencesResponse { preferences }))
}

async fn get_preference(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    key: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<PreferenceResponse>> {
    let key = path_key(key)?;
    let preference = state.api.get_preference_by_key(user.id(), &key).await?;
    Ok(Json(preference.into()))
}

async fn upsert_preferences(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<Json<UpsertPreferencesResponse>> {
    let body = body.map_err(|_| ApiError::invalid_request())?;
    let request: UpsertPreferencesRequest =
        serde_json::from_slice(&body).map_err(|_| ApiError::invalid_request())?;

    let preferences = request
        .preferences
        .filter(|prefs| !prefs.is_empty())
        .ok_or_else(ApiError::invalid_request)?;

    let updated_keys = state.api.upsert_preferences(user.id(), preferences).await?;
    Ok(Json(UpsertPreferencesResponse { updated_keys }))
}

async fn delete_preference(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    key: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let key = path_key(key)?;
    state.api.delete_preference(user.id(), &key).await?;
    Ok(Json(MessageResponse::deleted()))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

async fn render_metrics(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "failed to render metrics");
            ApiError(ServiceError::InternalError).into_response()
        }
    }
}

/// Percent-decoded, non-blank path key.
fn path_key(key: Result<Path<String>, PathRejection>) -> ApiResult<String> {
    match key {
        Ok(Path(key)) if !key.trim().is_empty() => Ok(key),
        _ => Err(ApiError::invalid_request()),
    }
}
