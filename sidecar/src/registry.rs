use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// Cumulative value, reported monotonically by the source.
    Counter,
    /// Instantaneous value, may go up or down between cycles.
    Gauge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metric {
    pub kind: MetricKind,
    pub value: i64,
}

/// Process-wide store of named metrics, shared between the status poller
/// (writer) and the HTTP surface (reader).
///
/// Updates are last-write-wins per metric. Each update takes the map lock
/// once, so individual updates are linearizable; no consistency is promised
/// across metrics within one read of the store.
#[derive(Clone, Default)]
pub struct MetricRegistry {
    metrics: Arc<RwLock<HashMap<String, Metric>>>,
}

impl MetricRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_counter(&self, name: &str, value: i64) {
        self.update(name, MetricKind::Counter, value)
    }

    pub fn update_gauge(&self, name: &str, value: i64) {
        self.update(name, MetricKind::Gauge, value)
    }

    fn update(&self, name: &str, kind: MetricKind, value: i64) {
        if let Ok(mut map) = self.metrics.write() {
            _ = map.insert(name.to_owned(), Metric { kind, value });
        } else {
            // Poisoned mutex: just warn, readers will keep the last good view
            warn!("poisoned MetricRegistry mutex, dropping update to {}", name);
        }
    }

    pub fn get(&self, name: &str) -> Option<Metric> {
        self.metrics
            .read()
            .ok()
            .and_then(|map| map.get(name).copied())
    }

    /// All registered metrics as (name, value) pairs, in unspecified order.
    pub fn list_metrics(&self) -> Vec<(String, i64)> {
        match self.metrics.read() {
            Ok(map) => map
                .iter()
                .map(|(name, metric)| (name.clone(), metric.value))
                .collect(),
            Err(_) => {
                warn!("poisoned MetricRegistry mutex, listing no metrics");
                Vec::new()
            }
        }
    }
}
