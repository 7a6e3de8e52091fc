use std::sync::Arc;

use envconfig::Envconfig;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::Notify;

use sidecar::config::Config;
use sidecar::lifecycle::LifecycleRegistry;
use sidecar::registry::MetricRegistry;
use sidecar::server::serve;

async fn shutdown(quit: Arc<Notify>) {
    let mut term = signal::unix::signal(signal::unix::SignalKind::terminate())
        .expect("failed to register SIGTERM handler");

    let mut interrupt = signal::unix::signal(signal::unix::SignalKind::interrupt())
        .expect("failed to register SIGINT handler");

    tokio::select! {
        _ = term.recv() => {},
        _ = interrupt.recv() => {},
        _ = quit.notified() => {},
    };

    tracing::info!("Shutting down gracefully...");
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = Config::init_from_env().expect("Invalid configuration:");

    tracing::info!(
        environment = config.environment.as_deref().unwrap_or("unknown"),
        domain = config.domain.as_deref().unwrap_or("unknown"),
        "starting proxy sidecar"
    );

    let registry = MetricRegistry::new();
    let lifecycle = LifecycleRegistry::new();

    // /quitquitquit and /abortabortabort drain the server through the same
    // graceful-shutdown path as SIGTERM.
    let quit = Arc::new(Notify::new());
    let notifier = quit.clone();
    lifecycle.register_shutdown_handler(move || notifier.notify_one());

    let listener = TcpListener::bind(config.address)
        .await
        .expect("could not bind port");

    serve(config, listener, registry, lifecycle, shutdown(quit))
        .await
        .expect("server failed");
}
