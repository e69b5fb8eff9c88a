#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use log::{info, warn};
use std::sync::Arc;

use magiclink::{
    handlers::{accept_token, authenticate, health, request_token},
    MagicLinkSettings, MagicLinkStrategy, UserDirectory,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Loads .env, Settings.toml and environment overrides, then starts the logger
    let settings = MagicLinkSettings::load()
        .map_err(|e| std::io::Error::other(format!("Failed to load settings: {e}")))?;

    let config = settings
        .strategy_config()
        .map_err(|e| std::io::Error::other(format!("Invalid magic link configuration: {e}")))?;

    let directory = UserDirectory::new(config.contact_field(), settings.users.clone());
    if directory.is_empty() {
        warn!("No users configured; every token request will fail with 'no user found'");
    }

    let strategy = MagicLinkStrategy::with_approve_client(
        config,
        &settings.approve.base_url,
        settings.approve_timeout(),
        Arc::new(directory),
    )
    .map_err(|e| std::io::Error::other(format!("Failed to create ApproveAPI client: {e}")))?;

    start_server(strategy, settings).await
}

/// Start the HTTP server
///
/// # Errors
///
/// Returns an error if:
/// - Server binding fails
/// - Server fails to start
async fn start_server(
    strategy: MagicLinkStrategy,
    settings: MagicLinkSettings,
) -> std::io::Result<()> {
    let bind_address = settings.get_bind_address();
    print_startup_info(&bind_address, &strategy);

    let strategy = web::Data::new(strategy);
    let cors_origins = settings.get_cors_origins();

    HttpServer::new(move || {
        let cors_origins = cors_origins.clone();
        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _| {
                cors_origins
                    .iter()
                    .any(|allowed| allowed == origin.to_str().unwrap_or(""))
            })
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec!["Content-Type", "Accept"])
            .max_age(3600);

        App::new()
            .app_data(strategy.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .configure(configure_services)
    })
    .bind(&bind_address)?
    .run()
    .await
}

fn configure_services(cfg: &mut web::ServiceConfig) {
    cfg.route("/auth/magic/request", web::post().to(request_token))
        .route("/auth/magic/request", web::get().to(request_token))
        .route("/auth/magic/callback", web::get().to(accept_token))
        .route("/auth/magic/callback", web::post().to(accept_token))
        .route("/auth/magic", web::get().to(authenticate))
        .route("/auth/magic", web::post().to(authenticate))
        .route("/ping", web::get().to(health));
}

fn print_startup_info(bind_address: &str, strategy: &MagicLinkStrategy) {
    let config = strategy.config();
    info!("Starting magic link server on http://{bind_address}");
    info!(
        "  GET|POST /auth/magic/request  - Deliver a magic link (contact field: {})",
        config.contact_field()
    );
    info!("  GET|POST /auth/magic/callback - Redeem a magic link token");
    info!("  GET|POST /auth/magic?action=  - requestToken | acceptToken");
    info!("  GET      /ping                - Health check");
    info!(
        "Magic links point at {} and expire after {}s",
        config.callback_url(),
        config.ttl_seconds()
    );
}
