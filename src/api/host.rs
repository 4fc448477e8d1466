//! Admin host endpoints.

use actix_web::{HttpResponse, get, web};
use serde::Serialize;

use crate::auth::Authorized;
use crate::config::Config;

/// Host status response.
#[derive(Serialize)]
pub struct HostStatusResponse {
    version: &'static str,
    environment: String,
    /// Name of the key that authorized this call.
    key_name: Option<String>,
}

/// Host status endpoint.
///
/// Registered behind an Admin gate; only the master key reaches it.
#[get("/host/status")]
pub async fn host_status(config: web::Data<Config>, auth: Authorized) -> HttpResponse {
    HttpResponse::Ok().json(HostStatusResponse {
        version: env!("CARGO_PKG_VERSION"),
        environment: config.environment.to_string(),
        key_name: auth.0.key_name,
    })
}

/// Configure admin host routes.
pub fn configure_host_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(host_status);
}
