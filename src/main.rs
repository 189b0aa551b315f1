mod api;
mod config;
mod enhance;
mod model;
mod service;
mod upstream;

use crate::api::AppState;
use crate::config::AppConfig;
use crate::enhance::Enhancer;
use crate::service::MovieService;
use crate::upstream::{HttpUpstream, Upstream};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    info!("🚀 Starting Movie Search API Server");

    // Load configuration
    let config = AppConfig::load()?;
    info!("📋 Configuration loaded");
    info!("   - Trakt: {}", config.trakt.base_url);
    info!(
        "   - Search: {} full / {} fast, {} workers",
        config.search.full_limit, config.search.fast_limit, config.search.workers
    );
    info!(
        "   - Related: {} full / {} fast, {} workers",
        config.related.full_limit, config.related.fast_limit, config.related.workers
    );
    if !config.tmdb.is_configured() {
        warn!("⚠️  TMDB_API_KEY not provided - poster images will not be available");
    }

    // Upstream providers and enhancement engine
    let upstream: Arc<dyn Upstream> = Arc::new(HttpUpstream::from_config(&config)?);
    let enhancer = Enhancer::from_config(upstream.clone(), &config);
    let service = Arc::new(MovieService::new(upstream, enhancer, &config));
    info!("✅ Upstream clients ready");

    let state = AppState { service };

    let app = api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("🌐 Server listening on http://{}", addr);
    info!("");
    info!("📡 Available endpoints:");
    info!("   GET  /api/health                      - Health check");
    info!("   GET  /api/search/movies?query=        - Search with enhancement");
    info!("   GET  /api/search/movies/fast?query=   - Search without enhancement");
    info!("   GET  /api/movies/{{id}}                 - Movie details");
    info!("   GET  /api/movies/{{id}}/enhance         - Enhance one movie");
    info!("   GET  /api/movies/{{id}}/related         - Related movies with ratings");
    info!("   GET  /api/movies/{{id}}/related/fast    - Related movies without enhancement");
    info!("");
    info!("✨ Server is ready to accept requests!");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server shutting down gracefully");

    Ok(())
}

/// Graceful shutdown handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("🛑 Shutdown signal received");
}
