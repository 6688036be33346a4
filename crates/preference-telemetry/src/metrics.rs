//! Prometheus metrics for the preference HTTP API.
//!
//! Metric names follow `preference_<area>_<metric>_<unit>`. Each
//! [`PreferenceMetrics`] owns its registry, so tests can build as many as
//! they like without colliding on global state.

use prometheus::{
    exponential_buckets, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};

use crate::TelemetryError;

/// HTTP request metrics.
#[derive(Clone)]
pub struct PreferenceMetrics {
    registry: Registry,
    requests_total: IntCounterVec,
    request_duration: HistogramVec,
    in_flight: IntGauge,
}

impl PreferenceMetrics {
    /// Create and register all metrics.
    pub fn new() -> Result<Self, TelemetryError> {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            Opts::new(
                "preference_http_requests_total",
                "Total HTTP requests by method, route and status code",
            ),
            &["method", "route", "status"],
        )?;

        let request_duration = HistogramVec::new(
            HistogramOpts::new(
                "preference_http_request_duration_seconds",
                "HTTP request latency",
            )
            .buckets(exponential_buckets(0.0005, 2.0, 14)?),
            &["method", "route"],
        )?;

        let in_flight = IntGauge::new(
            "preference_http_requests_in_flight",
            "HTTP requests currently being served",
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(request_duration.clone()))?;
        registry.register(Box::new(in_flight.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            request_duration,
            in_flight,
        })
    }

    /// Mark a request as started. The in-flight gauge is decremented when
    /// the returned guard is dropped, whether or not the request completed.
    pub fn request_started(&self) -> InFlightGuard {
        self.in_flight.inc();
        InFlightGuard {
            gauge: self.in_flight.clone(),
        }
    }

    /// Record a completed request.
    pub fn request_finished(&self, method: &str, route: &str, status: u16, seconds: f64) {
        self.requests_total
            .with_label_values(&[method, route, status.to_string().as_str()])
            .inc();
        self.request_duration
            .with_label_values(&[method, route])
            .observe(seconds);
    }

    /// Requests counted so far for one label set.
    pub fn requests(&self, method: &str, route: &str, status: u16) -> u64 {
        self.requests_total
            .with_label_values(&[method, route, status.to_string().as_str()])
            .get()
    }

    /// Requests currently in flight.
    pub fn in_flight(&self) -> i64 {
        self.in_flight.get()
    }

    /// Prometheus text exposition of every registered metric.
    pub fn render(&self) -> Result<String, TelemetryError> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
    }
}

/// Holds one unit of the in-flight gauge.
#[must_use = "the request stops counting as in flight when the guard is dropped"]
#[derive(Debug)]
pub struct InFlightGuard {
    gauge: IntGauge,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.gauge.dec();
    }
}

impl std::fmt::Debug for PreferenceMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreferenceMetrics")
            .field("in_flight", &self.in_flight.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instances_do_not_share_state() {
        let a = PreferenceMetrics::new().unwrap();
        let b = PreferenceMetrics::new().unwrap();

        let _guard = a.request_started();
        a.request_finished("GET", "/health", 200, 0.001);

        assert_eq!(a.requests("GET", "/health", 200), 1);
        assert_eq!(b.requests("GET", "/health", 200), 0);
    }

    #[test]
    fn test_in_flight_balances() {
        let metrics = PreferenceMetrics::new().unwrap();
        let first = metrics.request_started();
        let second = metrics.request_started();
        assert_eq!(metrics.in_flight(), 2);

        metrics.request_finished("PUT", "/users/me/preferences", 200, 0.01);
        drop(first);
        assert_eq!(metrics.in_flight(), 1);

        // abandoned without a recorded outcome
        drop(second);
        assert_eq!(metrics.in_flight(), 0);
        assert_eq!(metrics.requests("PUT", "/users/me/preferences", 200), 1);
    }

    #[test]
    fn test_render_contains_metric_names() {
        let metrics = PreferenceMetrics::new().unwrap();
        let _guard = metrics.request_started();
        metrics.request_finished("DELETE", "/users/me/preferences/{key}", 404, 0.002);

        let text = metrics.render().unwrap();
        assert!(text.contains("preference_http_requests_total"));
        assert!(text.contains("preference_http_request_duration_seconds"));
        assert!(text.contains("status=\"404\""));
    }
}
