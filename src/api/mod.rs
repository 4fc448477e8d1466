//! API endpoint modules.

pub mod health;
pub mod host;

pub use health::configure_health_routes;
pub use host::configure_host_routes;
