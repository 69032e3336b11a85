//! Worker bootstrap and lifecycle

use std::sync::Arc;

use club_common::{AppConfig, AppError};
use club_core::GroupMessenger;
use club_db::{create_pool, ensure_schema, PgMemberRepository, PgPaymentRepository, PoolConfig};
use club_service::{ServiceContext, ServiceContextBuilder, SubscriptionSettings};
use club_telegram::{PollerConfig, TelegramClient, UpdatePoller};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use crate::dispatcher::{run_arbiter, Dispatcher};
use crate::scheduler::{spawn_sweeps, SweepIntervals};

/// Queue depth between the poller, the dispatcher and the arbiter
const CHANNEL_CAPACITY: usize = 256;

/// Connect the store and assemble the service context around `messenger`
pub async fn create_service_context(
    config: &AppConfig,
    messenger: Arc<dyn GroupMessenger>,
) -> Result<ServiceContext, AppError> {
    info!("Connecting to PostgreSQL...");
    let pool = create_pool(&PoolConfig::from(&config.database))
        .await
        .map_err(AppError::database)?;
    ensure_schema(&pool).await.map_err(AppError::database)?;
    info!("PostgreSQL connection established");

    ServiceContextBuilder::new()
        .member_repo(Arc::new(PgMemberRepository::new(pool.clone())))
        .payment_repo(Arc::new(PgPaymentRepository::new(pool)))
        .messenger(messenger)
        .registry(config.registry())
        .settings(SubscriptionSettings::from_config(config))
        .build()
        .map_err(AppError::setup)
}

/// Run the worker until Ctrl-C
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let client = Arc::new(TelegramClient::from_config(&config.telegram).map_err(AppError::setup)?);

    let me = client
        .get_me()
        .await
        .map_err(|e| AppError::ExternalService(format!("getMe failed: {e}")))?;
    info!(bot_id = me.id, username = ?me.username, "Bot identity confirmed");

    let messenger: Arc<dyn GroupMessenger> = client.clone();
    let ctx = Arc::new(create_service_context(&config, messenger).await?);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (inbound_tx, inbound_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (membership_tx, membership_rx) = mpsc::channel(CHANNEL_CAPACITY);

    let poller = UpdatePoller::new(
        Arc::clone(&client),
        PollerConfig::default().with_timeout_secs(config.telegram.poll_timeout_secs),
    );
    let poller_task = tokio::spawn(poller.run(inbound_tx, shutdown_rx.clone()));
    let dispatcher_task = tokio::spawn(Dispatcher::new(Arc::clone(&ctx), membership_tx).run(inbound_rx));
    let arbiter_task = tokio::spawn(run_arbiter(Arc::clone(&ctx), membership_rx));

    let sweeps = spawn_sweeps(
        Arc::clone(&ctx),
        SweepIntervals::from_config(&config.subscription),
        &shutdown_rx,
    );

    info!("Bot worker running. Press Ctrl-C to stop.");
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal, stopping");
    }
    info!("Shutdown signal received");

    // Poller exit closes the inbound channel, which stops the dispatcher and
    // then the arbiter in turn
    let _ = shutdown_tx.send(true);
    for task in sweeps {
        if let Err(e) = task.await {
            warn!(error = %e, "Sweep task ended abnormally");
        }
    }
    for (name, task) in [
        ("poller", poller_task),
        ("dispatcher", dispatcher_task),
        ("arbiter", arbiter_task),
    ] {
        if let Err(e) = task.await {
            warn!(task = name, error = %e, "Task ended abnormally");
        }
    }

    info!("Bot worker stopped");
    Ok(())
}
