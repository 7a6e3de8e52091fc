use std::time::Instant;

use axum::{
    body::Body, extract::MatchedPath, http::Request, middleware::Next, response::IntoResponse,
};
use metrics::describe_gauge;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub const ACTIVE_CONNECTIONS: &str = "nginx_active_connections";
pub const TOTAL_ACCEPTS: &str = "nginx_total_accepts";
pub const TOTAL_HANDLED: &str = "nginx_total_handled";
pub const TOTAL_REQUESTS: &str = "nginx_total_requests";
pub const READING: &str = "nginx_reading";
pub const WRITING: &str = "nginx_writing";
pub const WAITING: &str = "nginx_waiting";

pub fn setup_metrics_recorder() -> PrometheusHandle {
    const EXPONENTIAL_SECONDS: &[f64] = &[
        0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
    ];

    let handle = PrometheusBuilder::new()
        .set_buckets(EXPONENTIAL_SECONDS)
        .expect("empty bucket list")
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    describe_instruments();

    handle
}

/// Declares the exported proxy instruments up front, so they carry help text
/// before the first poll cycle populates them.
fn describe_instruments() {
    describe_gauge!(ACTIVE_CONNECTIONS, "Total nginx_active_connections (gauge)");
    describe_gauge!(TOTAL_ACCEPTS, "Total nginx_total_accepts (count)");
    describe_gauge!(TOTAL_HANDLED, "Total nginx_total_handled (count)");
    describe_gauge!(TOTAL_REQUESTS, "Total nginx_total_requests (count)");
    describe_gauge!(READING, "Total nginx_reading (gauge)");
    describe_gauge!(WRITING, "Total nginx_writing (gauge)");
    describe_gauge!(WAITING, "Total nginx_waiting (gauge)");
}

/// Middleware to record some common HTTP metrics
/// Someday tower-http might provide a metrics middleware: https://github.com/tower-rs/tower-http/issues/57
pub async fn track_metrics(req: Request<Body>, next: Next) -> impl IntoResponse {
    let start = Instant::now();

    let path = if let Some(matched_path) = req.extensions().get::<MatchedPath>() {
        matched_path.as_str().to_owned()
    } else {
        req.uri().path().to_owned()
    };

    let method = req.method().clone();

    // Run the rest of the request handling first, so we can measure it and get response
    // codes.
    let response = next.run(req).await;

    let latency = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    let labels = [
        ("method", method.to_string()),
        ("path", path),
        ("status", status),
    ];

    metrics::counter!("http_requests_total", &labels).increment(1);
    metrics::histogram!("http_requests_duration_seconds", &labels).record(latency);

    response
}
