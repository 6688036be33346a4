//! Caller identity middleware.
//!
//! Reads the user id the upstream authentication layer placed in a trusted
//! header and stores it in request extensions as [`AuthenticatedUser`].
//! Requests without a usable id are answered with 401 before any handler
//! runs.

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::{HeaderName, Request},
    response::{IntoResponse, Response},
};
use tower::{Layer, Service};
use tracing::debug;

use crate::domain::error::ApiError;

/// User id of the caller, inserted by [`IdentityService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser(pub String);

impl AuthenticatedUser {
    pub fn id(&self) -> &str {
        &self.0
    }
}

/// Identity layer
#[derive(Clone)]
pub struct IdentityLayer {
    header: Arc<HeaderName>,
}

impl IdentityLayer {
    pub fn new(header: HeaderName) -> Self {
        Self {
            header: Arc::new(header),
        }
    }
}

impl<S> Layer<S> for IdentityLayer {
    type Service = IdentityService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        IdentityService {
            inner,
            header: Arc::clone(&self.header),
        }
    }
}

/// Identity service
#[derive(Clone)]
pub struct IdentityService<S> {
    inner: S,
    header: Arc<HeaderName>,
}

impl<S> Service<Request<Body>> for IdentityService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let user = extract_user_id(&req, &self.header);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            match user {
                Some(user_id) => {
                    req.extensions_mut().insert(AuthenticatedUser(user_id));
                    inner.call(req).await
                }
                None => {
                    debug!(path = %req.uri().path(), "request without caller identity");
                    Ok(ApiError::unauthenticated().into_response())
                }
            }
        })
    }
}

/// Trimmed, non-empty header value.
fn extract_user_id<B>(req: &Request<B>, header: &HeaderName) -> Option<String> {
    let value = req.headers().get(header)?.to_str().ok()?.trim();
    if value.is_empty() {
        return None;
    }
    Some(value.to_string())
}
