//! Prometheus metrics for the gateway.

use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "scut_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "scut_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "scut_http_requests_in_flight";

    // Backend metrics
    pub const BACKEND_REQUESTS_TOTAL: &str = "scut_backend_requests_total";
    pub const BACKEND_FAILURES_TOTAL: &str = "scut_backend_failures_total";
    pub const BACKEND_DURATION_SECONDS: &str = "scut_backend_duration_seconds";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, route: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("route", route.to_string()),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a call relayed by the backend (any HTTP status).
pub fn record_backend_response(action: &str, status: u16, duration_secs: f64) {
    let labels = [("action", action.to_string()), ("status", status.to_string())];
    counter!(names::BACKEND_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::BACKEND_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a call that never got a usable answer from the backend.
pub fn record_backend_failure(action: &str) {
    let labels = [("action", action.to_string())];
    counter!(names::BACKEND_FAILURES_TOTAL, &labels).increment(1);
}

/// Metrics middleware for HTTP requests.
///
/// Labels use the matched route template so ids never reach the label set.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);
    let response = next.run(request).await;
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    record_http_request(&method, &route, response.status().as_u16(), start.elapsed().as_secs_f64());

    response
}
