use std::net::SocketAddr;

use envconfig::Envconfig;

#[derive(Envconfig, Clone)]
pub struct Config {
    #[envconfig(default = "127.0.0.1:3000")]
    pub address: SocketAddr,

    /// Port the proxy's plaintext status page listens on (loopback only).
    pub status_port: u16,
    #[envconfig(default = "status")]
    pub status_path: String,
    #[envconfig(default = "3")]
    pub status_timeout_seconds: u64,
    #[envconfig(default = "5")]
    pub poll_interval_seconds: u64,

    #[envconfig(default = "true")]
    pub export_prometheus: bool,

    // Deployment identification only, not consumed by the poller or router.
    pub environment: Option<String>,
    pub domain: Option<String>,
}
