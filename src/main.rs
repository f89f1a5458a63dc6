// ABOUTME: Main entry point for the stockroom inventory service
// ABOUTME: Loads configuration, migrates the database, wires routes and serves HTTP

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod analysis;
mod auth;
mod blobs;
mod config;
mod crypto;
mod entities;
mod error;
mod extract;
mod handlers;
mod inventory;
mod labels;
mod metadata;
mod middleware;
mod migration;
mod multipart;
mod mutators;
mod schema;
mod session;
mod storage;
mod types;
mod utils;
mod validation;

#[cfg(test)]
mod integration_tests;
#[cfg(test)]
mod migration_tests;
#[cfg(test)]
mod mutator_tests;

use analysis::{ImageAnalyzer, OpenAiAnalyzer};
use config::Config;
use storage::Storage;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub storage: Arc<Storage>,
    pub analyzer: Option<Arc<dyn ImageAnalyzer>>,
}

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes();

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/config", get(handlers::get_config).post(handlers::get_config))
        // Auth
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        // Analysis and labels
        .route("/api/analyze-image", post(handlers::analyze_image))
        .route("/api/process-image", post(handlers::process_image))
        .route("/api/labels/generate", post(handlers::generate_label))
        .route("/api/categories", get(handlers::get_categories))
        // Images
        .route(
            "/api/images",
            get(handlers::list_images).post(handlers::upload_image),
        )
        .route(
            "/api/images/:id",
            get(handlers::get_image)
                .patch(handlers::update_image)
                .delete(handlers::delete_image),
        )
        .route("/api/images/:id/file", get(handlers::image_file))
        .route("/api/images/:id/reanalyze", post(handlers::reanalyze_image))
        // Items
        .route(
            "/api/items",
            get(handlers::search_items).post(handlers::create_item),
        )
        .route(
            "/api/items/:id",
            get(handlers::get_item)
                .patch(handlers::update_item)
                .delete(handlers::delete_item),
        )
        .route("/api/items/:id/history", get(handlers::item_history))
        .route("/api/items/:id/images", get(handlers::item_images))
        // Containers
        .route(
            "/api/containers",
            get(handlers::search_containers).post(handlers::create_container),
        )
        .route(
            "/api/containers/:id",
            get(handlers::get_container)
                .patch(handlers::update_container)
                .delete(handlers::delete_container),
        )
        .route("/api/containers/:id/history", get(handlers::container_history))
        .route("/api/containers/:id/images", get(handlers::container_images))
        .route("/api/containers/:id/items", get(handlers::container_items))
        .layer(from_fn(middleware::security_headers))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stockroom=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let addr = config.socket_addr()?;

    let storage = Storage::connect(&config).await?;
    tracing::info!("Database ready at {}", config.database_url);

    let purged = session::purge_expired(&storage.db).await?;
    if purged > 0 {
        tracing::info!(purged, "Removed expired session tokens");
    }

    let analyzer = OpenAiAnalyzer::from_config(&config)
        .map(|analyzer| Arc::new(analyzer) as Arc<dyn ImageAnalyzer>);
    if analyzer.is_none() {
        tracing::warn!("OPENAI_API_KEY is not set, image analysis is disabled");
    }

    let state = AppState {
        config: Arc::new(config),
        storage: Arc::new(storage),
        analyzer,
    };

    let app = build_router(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
