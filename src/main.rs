//! Funcgate - Main entry point.
//!
//! Starts the Actix-web gateway with the authorization gates configured per
//! scope.

use actix_cors::Cors;
use actix_web::{http::header, web, App, HttpServer};
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use funcgate::api;
use funcgate::auth::{AuthGate, GateSettings, SecretStoreHandle};
use funcgate::config::{Config, FUNCTIONS_KEY_HEADER};
use funcgate::middleware::RequestLogger;
use funcgate::secrets::FileSecretStore;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - RUST_ENV must be set to 'development' or 'production'");
            error!("  - In production, FUNCGATE_SECRETS_DIR must be set");
            error!("  - In production, FUNCGATE_AUTH_DISABLED must not be set");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  Funcgate");
    info!("  Environment: {}", config.environment);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
    }
    if config.auth_disabled {
        warn!("Key authorization is DISABLED - every request is allowed through!");
    }

    // Secrets come from JSON files under the configured directory
    let store = SecretStoreHandle::new(FileSecretStore::new(config.secrets_dir.clone()));
    info!("Secret store: {}", config.secrets_dir.display());

    let settings = GateSettings::from(&config);
    let bind_address = config.bind_address();
    let is_development = config.is_development();

    let worker_count = if is_development {
        info!(
            "Starting gateway at http://{} (4 workers - development mode)",
            bind_address
        );
        4
    } else {
        let cpus = num_cpus::get();
        info!(
            "Starting gateway at http://{} ({} workers)",
            bind_address, cpus
        );
        cpus
    };

    // Start HTTP server
    let server = HttpServer::new(move || {
        // Configure CORS
        let cors = if is_development {
            // Permissive CORS for development
            Cors::default()
                .allowed_origin("http://localhost:3000")
                .allowed_origin("http://127.0.0.1:3000")
                .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                .allowed_headers(vec![
                    header::AUTHORIZATION,
                    header::ACCEPT,
                    header::CONTENT_TYPE,
                    FUNCTIONS_KEY_HEADER.parse().unwrap(),
                ])
                .max_age(3600)
        } else {
            // Restrictive CORS for production (same-origin only)
            Cors::default()
                .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                .allowed_headers(vec![
                    header::AUTHORIZATION,
                    header::ACCEPT,
                    header::CONTENT_TYPE,
                    FUNCTIONS_KEY_HEADER.parse().unwrap(),
                ])
                .max_age(3600)
        };

        App::new()
            // Add CORS middleware (must be before other middleware)
            .wrap(cors)
            // Add request logging middleware
            .wrap(RequestLogger)
            // Add shared state
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(store.clone()))
            .app_data(web::Data::new(settings))
            // Operational endpoints: health is anonymous, admin surface is
            // master-key only
            .service(
                web::scope("/api")
                    .wrap(AuthGate::anonymous())
                    .configure(api::configure_health_routes),
            )
            .service(
                web::scope("/admin")
                    .wrap(AuthGate::admin())
                    .configure(api::configure_host_routes),
            )
    });

    // Set worker count
    server
        .workers(worker_count)
        .bind(&bind_address)?
        .run()
        .await
}
