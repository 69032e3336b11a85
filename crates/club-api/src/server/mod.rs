//! Server setup and initialization
//!
//! Provides the main application builder and server runner.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use club_common::{AppConfig, AppError};
use club_core::GroupMessenger;
use club_db::{create_pool, ensure_schema, PgMemberRepository, PgPaymentRepository, PoolConfig};
use club_service::{ServiceContextBuilder, SubscriptionSettings};
use club_telegram::TelegramClient;
use tokio::net::TcpListener;
use tracing::info;

use crate::middleware::{apply_middleware, apply_middleware_with_config};
use crate::routes::{create_router, health_routes};
use crate::state::AppState;

/// Build the complete Axum application with all routes and middleware
pub fn create_app(state: AppState) -> Result<Router, AppError> {
    let config = state.config();
    let api = apply_middleware_with_config(
        create_router(),
        &config.rate_limit,
        &config.cors,
        config.app.env.is_production(),
    )?;
    let health = apply_middleware(health_routes());

    Ok(api.merge(health).with_state(state))
}

/// Initialize all dependencies with the Telegram client as messenger
pub async fn create_app_state(config: AppConfig) -> Result<AppState, AppError> {
    let client = TelegramClient::from_config(&config.telegram).map_err(AppError::setup)?;
    create_app_state_with_messenger(config, Arc::new(client)).await
}

/// Initialize all dependencies around the given messenger
pub async fn create_app_state_with_messenger(
    config: AppConfig,
    messenger: Arc<dyn GroupMessenger>,
) -> Result<AppState, AppError> {
    info!("Connecting to PostgreSQL...");
    let pool = create_pool(&PoolConfig::from(&config.database))
        .await
        .map_err(AppError::database)?;
    ensure_schema(&pool).await.map_err(AppError::database)?;
    info!("PostgreSQL connection established");

    let service_context = ServiceContextBuilder::new()
        .member_repo(Arc::new(PgMemberRepository::new(pool.clone())))
        .payment_repo(Arc::new(PgPaymentRepository::new(pool.clone())))
        .messenger(messenger)
        .registry(config.registry())
        .settings(SubscriptionSettings::from_config(&config))
        .build()
        .map_err(AppError::setup)?;

    Ok(AppState::new(service_context, pool, config))
}

/// Run the HTTP server
pub async fn run_server(app: Router, addr: SocketAddr) -> Result<(), AppError> {
    info!("Starting HTTP server on {}", addr);

    let listener = TcpListener::bind(addr).await.map_err(AppError::Server)?;

    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    Ok(())
}

/// Run the complete server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr: SocketAddr = config
        .api
        .address()
        .parse()
        .map_err(|e| AppError::setup(format!("invalid API address: {e}")))?;

    let state = create_app_state(config).await?;
    let app = create_app(state)?;

    run_server(app, addr).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
