mod config;
mod db;
mod error;
mod metrics;
mod middleware;
mod models;
mod routes;
mod services;

use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::Db;
use crate::services::fetcher::PlaylistFetcher;

/// Application state shared across handlers
pub struct AppState {
    pub config: Config,
    pub db: Db,
    pub fetcher: PlaylistFetcher,
    pub start_time: Instant,
}

/// Build the HTTP router with all routes and middleware
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health endpoints
        .route("/", get(routes::health::root))
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::health::metrics))
        .route("/live", get(routes::health::live))
        // Account endpoints
        .route("/api/auth/register", post(routes::auth::register))
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/auth/verify", get(routes::auth::verify))
        .route("/api/auth/profile", get(routes::auth::profile))
        // Playlist endpoints
        .route("/api/playlist/import", post(routes::playlist::import_playlist))
        .route("/api/playlist/list", get(routes::playlist::list_playlists))
        .route(
            "/api/playlist/:id",
            get(routes::playlist::get_playlist).delete(routes::playlist::delete_playlist),
        )
        // XStream connection endpoints
        .route("/api/xstream/generate", post(routes::xtream::generate_connection))
        .route("/api/xstream/list", get(routes::xtream::list_connections))
        .route(
            "/api/xstream/:id",
            get(routes::xtream::get_connection).delete(routes::xtream::delete_connection),
        )
        // Player API for IPTV apps
        .route("/player_api.php", get(routes::xtream::player_api))
        .route("/api/xstream/player_api.php", get(routes::xtream::player_api))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "xstream_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    // Load configuration
    let config = Config::from_env();
    let port = config.port;

    tracing::info!("Starting XStream Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.node_env);

    // Initialize file store
    let db = db::open(&config).await?;

    // Initialize playlist downloader
    let fetcher = PlaylistFetcher::from_config(&config)?;
    tracing::info!(
        "Playlist fetcher initialized (timeout {}ms, limit {}MB)",
        config.fetch_timeout_ms,
        config.max_m3u_size_mb
    );

    // Build application state
    let state = Arc::new(AppState {
        config,
        db,
        fetcher,
        start_time: Instant::now(),
    });

    let app = build_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
