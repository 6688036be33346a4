//! # preference-gateway
//!
//! HTTP front end for the preference service.
//!
//! ## Architecture
//!
//! ```text
//! client ──→ Trace → CORS → BodyLimit → Metrics ──┬──→ /health, /metrics
//!                                                 │
//!                                                 └──→ Identity ──→ handlers ──→ PreferenceApi
//! ```
//!
//! The caller's user id is read from a trusted header set by the upstream
//! authentication layer (default `x-user-id`). Every failure is answered
//! with `{"code","message","description"}`.
//!
//! ## Usage
//!
//! ```ignore
//! use preference_gateway::{GatewayConfig, PreferenceGateway};
//!
//! let gateway = PreferenceGateway::new(GatewayConfig::default(), api, metrics)?;
//! gateway.serve_with_shutdown(shutdown_signal()).await?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod domain;
pub mod middleware;
pub mod router;
pub mod service;

pub use domain::config::{ConfigError, CorsConfig, GatewayConfig};
pub use domain::error::{ApiError, ApiResult, ErrorResponse, GatewayError};
pub use domain::types::*;
pub use router::{build_router, AppState};
pub use service::PreferenceGateway;
