//! Restock - Replenishment Transaction & Delivery Reconciliation Engine
//!
//! Validates proposed purchases against per-SKU and global constraints,
//! allocates order quantities across vendors, tracks each vendor leg
//! through its delivery state machine, and reconciles confirmed
//! deliveries into the inventory ledger exactly once.

use axum::{routing::get, Router};
use sqlx::postgres::PgPoolOptions;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::sync::watch;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod external;
mod handlers;
mod routes;
mod services;

pub use config::Config;

use external::PredictionClient;
use services::ReconciliationScheduler;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: Arc<Config>,
    pub prediction: PredictionClient,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "restock_server=debug,tower_http=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let config = config::Config::load()?;

    tracing::info!(environment = %config.environment, "Starting restock server");

    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&config.database.url)
        .await?;

    if config.environment == "development" {
        tracing::info!("Running database migrations");
        sqlx::migrate!("./migrations").run(&db_pool).await?;
    }

    let prediction = PredictionClient::new(
        config.prediction.base_url.clone(),
        Duration::from_secs(config.prediction.timeout_seconds),
    )
    .map_err(|e| anyhow::anyhow!("{}", e))?;

    let state = AppState {
        db: db_pool.clone(),
        config: Arc::new(config.clone()),
        prediction,
    };

    // The reconciliation scheduler runs on its own timer, independent of
    // request handling, and stops on the shutdown signal
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler_handle = if config.scheduler.enabled {
        let scheduler = ReconciliationScheduler::new(
            db_pool,
            Duration::from_secs(config.scheduler.interval_seconds),
            shutdown_rx,
        );
        Some(tokio::spawn(scheduler.run()))
    } else {
        tracing::info!("Reconciliation scheduler disabled by configuration");
        None
    };

    let app = create_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!(%addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Drain the scheduler before exiting so a mid-tick scan completes
    let _ = shutdown_tx.send(true);
    if let Some(handle) = scheduler_handle {
        let _ = handle.await;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}

/// Create the application router with all routes and middleware
fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Restock Replenishment API v1.0"
}
