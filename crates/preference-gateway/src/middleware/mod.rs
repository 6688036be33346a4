//! Middleware stack for the preference gateway.
//!
//! Layer order (outermost first):
//! Trace → CORS → BodyLimitError → BodyLimit → Metrics → Identity → Handler.
//! Identity is applied only to the preference routes; `/health` and
//! `/metrics` are anonymous.

pub mod body_limit;
pub mod cors;
pub mod identity;
pub mod metrics;

pub use body_limit::{body_limit_error_layer, body_limit_layer};
pub use cors::create_cors_layer;
pub use identity::{AuthenticatedUser, IdentityLayer};
pub use metrics::MetricsLayer;
