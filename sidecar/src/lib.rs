pub mod config;
pub mod endpoints;
pub mod lifecycle;
pub mod poller;
pub mod prometheus;
pub mod registry;
pub mod router;
pub mod server;
pub mod status;
