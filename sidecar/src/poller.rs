use std::time::Duration;

use metrics::gauge;
use thiserror::Error;
use tracing::{debug, error};

use crate::config::Config;
use crate::prometheus;
use crate::registry::MetricRegistry;
use crate::status::{parse_status, StatusSnapshot};

#[derive(Error, Debug)]
enum PollError {
    #[error("request failed: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("unexpected status code: {0}")]
    BadStatus(reqwest::StatusCode),
}

/// Polls the proxy status page and publishes the parsed values to both the
/// internal metric registry and the Prometheus exporter instruments.
///
/// A poll cycle never takes the host process down with it: fetch errors,
/// timeouts and format drift are logged and swallowed, and any value that
/// fails to parse this cycle simply keeps its previously published reading.
pub struct StatusPoller {
    port: u16,
    path: String,
    timeout: Duration,
    registry: MetricRegistry,
    client: reqwest::Client,
}

impl StatusPoller {
    pub fn new(config: &Config, registry: MetricRegistry) -> Self {
        Self {
            port: config.status_port,
            path: config.status_path.clone(),
            timeout: Duration::from_secs(config.status_timeout_seconds),
            registry,
            client: reqwest::Client::new(),
        }
    }

    /// Runs poll cycles forever on a fixed interval. Meant to be spawned on
    /// its own task, decoupled from request handling.
    pub async fn run(self, poll_interval: Duration) {
        let mut interval = tokio::time::interval(poll_interval);
        loop {
            interval.tick().await;
            self.publish().await;
        }
    }

    /// One fetch-parse-publish cycle. Infallible by contract: every failure
    /// is logged with the attempted URL and swallowed.
    pub async fn publish(&self) {
        debug!("publishing proxy metrics");
        let url = format!("http://127.0.0.1:{}/{}", self.port, self.path);
        if let Err(err) = self.poll(&url).await {
            error!("failed to fetch proxy metrics for {}: {}", url, err);
        }
    }

    async fn poll(&self, url: &str) -> Result<(), PollError> {
        let response = self.client.get(url).timeout(self.timeout).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PollError::BadStatus(status));
        }

        let body = response.text().await?;
        self.publish_snapshot(parse_status(&body));
        Ok(())
    }

    /// Each matched group feeds both sinks with the same parsed integer, so
    /// the registry and the exporter never diverge within a cycle. Unmatched
    /// groups are not touched, stale values stay published.
    fn publish_snapshot(&self, snapshot: StatusSnapshot) {
        if let Some(active) = snapshot.active_connections {
            self.registry
                .update_gauge(&metric_name("active_connections"), active);
            gauge!(prometheus::ACTIVE_CONNECTIONS).set(active as f64);
        }

        if let Some(totals) = snapshot.totals {
            self.registry
                .update_counter(&metric_name("total_accepts"), totals.accepts);
            self.registry
                .update_counter(&metric_name("total_handled"), totals.handled);
            self.registry
                .update_counter(&metric_name("total_requests"), totals.requests);
            gauge!(prometheus::TOTAL_ACCEPTS).set(totals.accepts as f64);
            gauge!(prometheus::TOTAL_HANDLED).set(totals.handled as f64);
            gauge!(prometheus::TOTAL_REQUESTS).set(totals.requests as f64);
        }

        if let Some(workers) = snapshot.workers {
            self.registry
                .update_gauge(&metric_name("reading"), workers.reading);
            self.registry
                .update_gauge(&metric_name("writing"), workers.writing);
            self.registry
                .update_gauge(&metric_name("waiting"), workers.waiting);
            gauge!(prometheus::READING).set(workers.reading as f64);
            gauge!(prometheus::WRITING).set(workers.writing as f64);
            gauge!(prometheus::WAITING).set(workers.waiting as f64);
        }
    }
}

fn metric_name(postfix: &str) -> String {
    format!("proxy.{}", postfix)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, RwLock};

    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;

    use super::*;

    const STATUS_BODY: &str =
        "Active connections: 4\n\nreading 10 20 30\nReading: 1 Writing: 2 Waiting: 3\n";

    fn test_config(port: u16) -> Config {
        Config {
            address: "127.0.0.1:0".parse().unwrap(),
            status_port: port,
            status_path: "status".to_string(),
            status_timeout_seconds: 3,
            poll_interval_seconds: 5,
            export_prometheus: false,
            environment: None,
            domain: None,
        }
    }

    async fn spawn_status_page(body: Arc<RwLock<String>>) -> u16 {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let app = Router::new().route(
            "/status",
            get(move || {
                let body = body.clone();
                async move { body.read().unwrap().clone() }
            }),
        );
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        port
    }

    fn sorted_metrics(registry: &MetricRegistry) -> Vec<(String, i64)> {
        let mut metrics = registry.list_metrics();
        metrics.sort();
        metrics
    }

    #[tokio::test]
    async fn publishes_all_seven_metrics() {
        let body = Arc::new(RwLock::new(STATUS_BODY.to_string()));
        let port = spawn_status_page(body).await;

        let registry = MetricRegistry::new();
        let poller = StatusPoller::new(&test_config(port), registry.clone());
        poller.publish().await;

        assert_eq!(
            sorted_metrics(&registry),
            vec![
                ("proxy.active_connections".to_string(), 4),
                ("proxy.reading".to_string(), 1),
                ("proxy.total_accepts".to_string(), 10),
                ("proxy.total_handled".to_string(), 20),
                ("proxy.total_requests".to_string(), 30),
                ("proxy.waiting".to_string(), 3),
                ("proxy.writing".to_string(), 2),
            ]
        );
    }

    #[tokio::test]
    async fn partial_page_leaves_stale_values_untouched() {
        let body = Arc::new(RwLock::new(STATUS_BODY.to_string()));
        let port = spawn_status_page(body.clone()).await;

        let registry = MetricRegistry::new();
        let poller = StatusPoller::new(&test_config(port), registry.clone());
        poller.publish().await;

        // Second cycle only carries the active connection count.
        *body.write().unwrap() = "Active connections: 9\n".to_string();
        poller.publish().await;

        assert_eq!(
            sorted_metrics(&registry),
            vec![
                ("proxy.active_connections".to_string(), 9),
                ("proxy.reading".to_string(), 1),
                ("proxy.total_accepts".to_string(), 10),
                ("proxy.total_handled".to_string(), 20),
                ("proxy.total_requests".to_string(), 30),
                ("proxy.waiting".to_string(), 3),
                ("proxy.writing".to_string(), 2),
            ]
        );
    }

    #[tokio::test]
    async fn non_success_response_publishes_nothing() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let app = Router::new().route(
            "/status",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "proxy restarting") }),
        );
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let registry = MetricRegistry::new();
        let poller = StatusPoller::new(&test_config(port), registry.clone());
        poller.publish().await;

        assert!(registry.list_metrics().is_empty());
    }

    #[tokio::test]
    async fn unreachable_proxy_publishes_nothing() {
        // Bind and immediately drop to get a port nobody listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let registry = MetricRegistry::new();
        let poller = StatusPoller::new(&test_config(port), registry.clone());
        poller.publish().await;

        assert!(registry.list_metrics().is_empty());
    }
}
