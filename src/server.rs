use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{
    catalog::SqliteCatalogStore,
    config::Config,
    db,
    handlers::{self, AppState},
    signals::setup_signal_handlers,
};

/// Start the estimator server
///
/// This function:
/// 1. Opens the catalog database and runs migrations
/// 2. Builds the shared handler state
/// 3. Starts the idle-session sweeper
/// 4. Serves requests until SIGTERM/SIGINT
pub async fn start_server(config: Config) -> Result<()> {
    let pool = db::connect(&config.database).await?;
    let store = Arc::new(SqliteCatalogStore::new(pool.clone()));

    let (shutdown_tx, signal_handle) = setup_signal_handlers();
    let mut shutdown_rx = shutdown_tx.subscribe();

    let cleanup_every = Duration::from_secs(config.sessions.cleanup_interval_seconds);
    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    let state = AppState::from_config(config, store)?;

    let cleanup_handle = tokio::spawn(Arc::clone(&state.sessions).idle_cleanup_loop(cleanup_every));

    info!("Starting estimator on {}", addr);
    info!(
        consult_url = %state.config.handoff.consult_url,
        locale = %state.config.handoff.locale,
        currency = %state.config.handoff.currency,
        "Handoff configured"
    );

    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
            info!("Shutdown signal received, draining connections...");
        })
        .await?;

    cleanup_handle.abort();
    signal_handle.await?;
    pool.close().await;
    info!("Server stopped gracefully");

    Ok(())
}

/// Create the Axum router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let sessions = Router::new()
        .route("/", post(handlers::sessions::create_session))
        .route(
            "/:id",
            get(handlers::sessions::get_session).delete(handlers::sessions::delete_session),
        )
        .route("/:id/selection", put(handlers::sessions::update_selection))
        .route("/:id/calculate", post(handlers::sessions::calculate))
        .route("/:id/recalculate", post(handlers::sessions::recalculate))
        .route("/:id/consult", get(handlers::sessions::consult));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/api/catalog", get(handlers::catalog::get_catalog))
        .route("/api/estimate", post(handlers::estimate::create_estimate))
        .nest("/api/sessions", sessions)
        .with_state(state)
        // Selections are tiny; 64KB is plenty
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(TraceLayer::new_for_http())
}
