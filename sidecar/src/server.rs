use std::future::Future;
use std::time::Duration;

use tokio::net::TcpListener;

use crate::config::Config;
use crate::lifecycle::LifecycleRegistry;
use crate::poller::StatusPoller;
use crate::registry::MetricRegistry;
use crate::router;

/// Serves the lifecycle surface on `listener` and runs the status poller on
/// its own task until `shutdown` resolves.
///
/// The poller task never shares an execution context with request handling:
/// a slow or hung status fetch cannot delay the HTTP surface.
pub async fn serve<F>(
    config: Config,
    listener: TcpListener,
    registry: MetricRegistry,
    lifecycle: LifecycleRegistry,
    shutdown: F,
) -> Result<(), std::io::Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    let poller = StatusPoller::new(&config, registry.clone());
    let poll_task = tokio::spawn(poller.run(Duration::from_secs(config.poll_interval_seconds)));

    let app = router::router(registry, lifecycle, config.export_prometheus);

    tracing::info!("listening on {:?}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    poll_task.abort();
    Ok(())
}
