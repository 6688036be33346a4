//! Request metrics middleware.
//!
//! Records method, matched route and status for every request into
//! [`PreferenceMetrics`]. Must be added with `Router::layer` so the matched
//! route template is available; unmatched requests are labelled
//! `unmatched` to keep label cardinality bounded.

use std::task::{Context, Poll};
use std::time::Instant;

use axum::{body::Body, extract::MatchedPath, http::Request, response::Response};
use preference_telemetry::PreferenceMetrics;
use tower::{Layer, Service};

/// Metrics layer
#[derive(Clone)]
pub struct MetricsLayer {
    metrics: PreferenceMetrics,
}

impl MetricsLayer {
    pub fn new(metrics: PreferenceMetrics) -> Self {
        Self { metrics }
    }
}

impl<S> Layer<S> for MetricsLayer {
    type Service = MetricsService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MetricsService {
            inner,
            metrics: self.metrics.clone(),
        }
    }
}

/// Metrics service
#[derive(Clone)]
pub struct MetricsService<S> {
    inner: S,
    metrics: PreferenceMetrics,
}

impl<S> Service<Request<Body>> for MetricsService<S>
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

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().to_string();
        let route = req
            .extensions()
            .get::<MatchedPath>()
            .map(|p| p.as_str().to_string())
            .unwrap_or_else(|| "unmatched".to_string());
        let metrics = self.metrics.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let started = Instant::now();
            let _in_flight = metrics.request_started();

            let result = inner.call(req).await;

            let status = match &result {
                Ok(response) => response.status().as_u16(),
                Err(_) => 500,
            };
            metrics.request_finished(&method, &route, status, started.elapsed().as_secs_f64());
            result
        })
    }
}
