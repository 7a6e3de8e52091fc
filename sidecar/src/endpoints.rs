use std::collections::BTreeMap;

use axum::extract::State;
use axum::Json;

use crate::router;

/// Runs the registered shutdown handlers and acknowledges unconditionally.
/// Fire-and-forget: a 200 here means the handlers were invoked, not that
/// shutdown completed.
pub async fn quitquitquit(State(state): State<router::State>) -> &'static str {
    state.lifecycle.execute_shutdown_handlers();
    "OK"
}

/// Same behavior as `/quitquitquit`: no separate hard-abort path exists.
pub async fn abortabortabort(State(state): State<router::State>) -> &'static str {
    state.lifecycle.execute_shutdown_handlers();
    "OK"
}

pub async fn health(State(state): State<router::State>) -> String {
    let (ok, message) = state.lifecycle.check_health();
    if !ok {
        // Still respond with 200, otherwise the supervising UI doesn't show
        // the failure text.
        return format!("Health checks failed: {}", message);
    }
    "OK".to_string()
}

/// All registry metrics as a JSON object with keys in ascending name order.
pub async fn metrics_json(State(state): State<router::State>) -> Json<BTreeMap<String, i64>> {
    Json(state.registry.list_metrics().into_iter().collect())
}

/// Plaintext `name value` dump of the registry, one metric per line, sorted
/// by name.
pub async fn metrics_text(State(state): State<router::State>) -> String {
    let mut metrics = state.registry.list_metrics();
    metrics.sort_by(|a, b| a.0.cmp(&b.0));
    metrics
        .iter()
        .map(|(name, value)| format!("{} {}", name, value))
        .collect::<Vec<_>>()
        .join("\n")
}
