use std::sync::{Arc, Mutex, RwLock};

use tracing::{debug, info, warn};

type ShutdownHandler = Box<dyn Fn() + Send + Sync>;
type HealthCheckHandler = Box<dyn Fn() -> (bool, String) + Send + Sync>;

/// Holds the shutdown and health-check collaborators invoked by the HTTP
/// surface. The surface owns neither behavior: handlers are registered by
/// the embedding process and called in registration order.
#[derive(Clone, Default)]
pub struct LifecycleRegistry {
    shutdown_handlers: Arc<Mutex<Vec<ShutdownHandler>>>,
    health_checks: Arc<RwLock<Vec<HealthCheckHandler>>>,
}

impl LifecycleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callable to be executed at application shutdown.
    pub fn register_shutdown_handler(&self, handler: impl Fn() + Send + Sync + 'static) {
        if let Ok(mut handlers) = self.shutdown_handlers.lock() {
            handlers.push(Box::new(handler));
        } else {
            warn!("poisoned shutdown handler mutex, dropping registration");
        }
    }

    /// Registers a callable returning (success, message), executed when
    /// application health is queried.
    pub fn register_health_check(
        &self,
        handler: impl Fn() -> (bool, String) + Send + Sync + 'static,
    ) {
        if let Ok(mut checks) = self.health_checks.write() {
            checks.push(Box::new(handler));
        } else {
            warn!("poisoned health check mutex, dropping registration");
        }
    }

    /// Runs all registered shutdown handlers in registration order.
    ///
    /// The handler list is drained first, so each handler runs at most once
    /// even when both shutdown endpoints are hit.
    pub fn execute_shutdown_handlers(&self) {
        info!("executing shutdown handlers");
        let handlers: Vec<ShutdownHandler> = match self.shutdown_handlers.lock() {
            Ok(mut handlers) => handlers.drain(..).collect(),
            Err(_) => {
                warn!("poisoned shutdown handler mutex, running no handlers");
                Vec::new()
            }
        };
        for handler in handlers {
            handler();
        }
    }

    /// Runs registered health checks in order, stopping at the first failure.
    /// Returns (true, "OK") when every check passes or none are registered.
    pub fn check_health(&self) -> (bool, String) {
        let checks = match self.health_checks.read() {
            Ok(checks) => checks,
            Err(_) => {
                warn!("poisoned health check mutex");
                return (false, "health check registry unavailable".to_string());
            }
        };
        debug!("executing {} health check handlers", checks.len());
        for check in checks.iter() {
            let (ok, message) = check();
            if !ok {
                return (false, message);
            }
        }
        (true, "OK".to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn shutdown_handlers_run_in_registration_order() {
        let lifecycle = LifecycleRegistry::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for id in 0..3 {
            let order = order.clone();
            lifecycle.register_shutdown_handler(move || order.lock().unwrap().push(id));
        }

        lifecycle.execute_shutdown_handlers();
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn shutdown_handlers_run_exactly_once() {
        let lifecycle = LifecycleRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = calls.clone();
        lifecycle.register_shutdown_handler(move || {
            counted.fetch_add(1, Ordering::SeqCst);
        });

        lifecycle.execute_shutdown_handlers();
        lifecycle.execute_shutdown_handlers();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn health_defaults_to_ok() {
        let lifecycle = LifecycleRegistry::new();
        assert_eq!(lifecycle.check_health(), (true, "OK".to_string()));
    }

    #[test]
    fn health_reports_first_failure() {
        let lifecycle = LifecycleRegistry::new();
        lifecycle.register_health_check(|| (true, "upstream reachable".to_string()));
        lifecycle.register_health_check(|| (false, "proxy not running".to_string()));
        lifecycle.register_health_check(|| (false, "config stale".to_string()));

        assert_eq!(
            lifecycle.check_health(),
            (false, "proxy not running".to_string())
        );
    }

    #[test]
    fn health_passes_when_all_checks_pass() {
        let lifecycle = LifecycleRegistry::new();
        lifecycle.register_health_check(|| (true, "upstream reachable".to_string()));
        lifecycle.register_health_check(|| (true, "proxy running".to_string()));

        assert_eq!(lifecycle.check_health(), (true, "OK".to_string()));
    }
}
