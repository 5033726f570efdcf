//! Prometheus metrics for the API server.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

use crate::config::OUTPUT_URL_PREFIX;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "reel_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "reel_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "reel_http_requests_in_flight";

    // Generation metrics
    pub const VIDEOS_GENERATED_TOTAL: &str = "reel_videos_generated_total";
    pub const GENERATION_FAILURES_TOTAL: &str = "reel_generation_failures_total";
    pub const AI_FAILURES_TOTAL: &str = "reel_ai_failures_total";
    pub const UPLOAD_BYTES_TOTAL: &str = "reel_upload_bytes_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a successfully generated video.
pub fn record_video_generated(has_logo: bool, has_music: bool) {
    let labels = [
        ("logo", has_logo.to_string()),
        ("music", has_music.to_string()),
    ];
    counter!(names::VIDEOS_GENERATED_TOTAL, &labels).increment(1);
}

/// Record a failed generation request by error kind.
pub fn record_generation_failure(kind: &str) {
    let labels = [("kind", kind.to_string())];
    counter!(names::GENERATION_FAILURES_TOTAL, &labels).increment(1);
}

/// Record a caption generation failure.
pub fn record_ai_failure() {
    counter!(names::AI_FAILURES_TOTAL).increment(1);
}

/// Record bytes received for an upload slot.
pub fn record_upload_bytes(slot: &str, bytes: u64) {
    let labels = [("slot", slot.to_string())];
    counter!(names::UPLOAD_BYTES_TOTAL, &labels).increment(bytes);
}

/// Fixed routes recorded under their own label.
const KNOWN_ROUTES: &[&str] = &["/api/generate-video", "/health", "/healthz", "/ready", "/metrics"];

/// Sanitize path for metrics labels. Anything that is not a route becomes `other`.
fn sanitize_path(path: &str) -> String {
    if KNOWN_ROUTES.contains(&path) {
        return path.to_string();
    }
    match path.strip_prefix(OUTPUT_URL_PREFIX) {
        Some(rest) if rest.len() > 1 && rest.starts_with('/') => {
            format!("{OUTPUT_URL_PREFIX}/:file")
        }
        _ => "other".to_string(),
    }
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    // Increment in-flight counter
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    // Decrement in-flight counter
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}
