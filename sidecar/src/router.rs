use std::future::ready;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::endpoints;
use crate::lifecycle::LifecycleRegistry;
use crate::prometheus::{setup_metrics_recorder, track_metrics};
use crate::registry::MetricRegistry;

#[derive(Clone)]
pub struct State {
    pub registry: MetricRegistry,
    pub lifecycle: LifecycleRegistry,
}

async fn index() -> &'static str {
    "proxy sidecar"
}

pub fn router(registry: MetricRegistry, lifecycle: LifecycleRegistry, metrics: bool) -> Router {
    let state = State {
        registry,
        lifecycle,
    };

    let router = Router::new()
        .route("/", get(index))
        .route("/quitquitquit", post(endpoints::quitquitquit))
        .route("/abortabortabort", post(endpoints::abortabortabort))
        .route("/health", get(endpoints::health))
        .route("/metrics", get(endpoints::metrics_text))
        .route("/metrics.json", get(endpoints::metrics_json))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(track_metrics))
        .with_state(state);

    // Don't install the Prometheus recorder unless asked to.
    // Installing a global recorder when sidecar is used as a library (during tests etc)
    // does not work well.
    if metrics {
        let recorder_handle = setup_metrics_recorder();

        router.route(
            "/metrics/prometheus",
            get(move || ready(recorder_handle.render())),
        )
    } else {
        router
    }
}
