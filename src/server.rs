use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::{net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{
    config::Config,
    handlers::{self, AppState},
    metrics,
    signals::setup_signal_handlers,
    store::{spawn_maintenance_task, Clock, LogStore, MaintenanceConfig},
};

/// Start the logvault server
///
/// This function:
/// 1. Initializes metrics
/// 2. Opens the log store (creating the database if missing)
/// 3. Sets up signal handlers for graceful shutdown
/// 4. Spawns the scheduled-maintenance task
/// 5. Serves the storage API with graceful shutdown support
pub async fn start_server(config: Config) -> Result<()> {
    info!("Initializing Prometheus metrics...");
    let metrics_handle = Arc::new(metrics::init_metrics());

    let database_url = format!("sqlite:{}", config.storage.database_path);
    let store = Arc::new(LogStore::open(&database_url, Clock::system()).await?);

    let (shutdown_tx, signal_handle) = setup_signal_handlers();
    let mut shutdown_rx = shutdown_tx.subscribe();

    spawn_maintenance_task(
        store.clone(),
        MaintenanceConfig {
            maintenance_hour: config.retention.maintenance_hour,
            check_interval: std::time::Duration::from_secs(config.retention.check_interval_secs),
            keep_time: config.retention.keep_time(),
            per_application: config.retention.per_application_keep(),
        },
    );

    let state = AppState {
        store,
        retention: config.retention.clone(),
    };
    let app = create_router(state, metrics_handle);

    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    info!("Starting logvault on {}", addr);
    info!(
        "Configuration: retention {} days, maintenance at {:02}:00 UTC",
        config.retention.keep_days, config.retention.maintenance_hour
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
            info!("Shutdown signal received, draining connections...");
        })
        .await?;

    signal_handle.await?;
    info!("Server stopped gracefully");

    Ok(())
}

/// Create the Axum router with all routes and middleware
pub fn create_router(state: AppState, metrics_handle: Arc<PrometheusHandle>) -> Router {
    let api_routes = Router::new()
        .route(
            "/api/logs",
            post(handlers::logs::add_log).get(handlers::logs::search_logs),
        )
        .route("/api/logs/batch", post(handlers::logs::add_log_batch))
        .route("/api/status", post(handlers::statuses::update_status))
        .route("/api/statuses", get(handlers::statuses::get_statuses))
        .route(
            "/api/maintenance/run",
            post(handlers::maintenance::run_maintenance),
        )
        .with_state(state);

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics_handler::metrics))
        .with_state(metrics_handle)
        .merge(api_routes)
        // Batches can be large, but bound them to keep memory in check
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .layer(TraceLayer::new_for_http())
}
