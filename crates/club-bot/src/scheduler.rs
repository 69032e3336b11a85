//! Sweep scheduling
//!
//! Every sweep runs on its own `tokio::time::interval` with
//! [`MissedTickBehavior::Skip`]: a tick that overruns its period delays the
//! next one instead of stacking, so a sweep never overlaps itself.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use club_common::SubscriptionConfig;
use club_service::{ReconciliationService, ServiceContext};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// Periods of the four sweeps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepIntervals {
    pub expiry: Duration,
    pub removal_retry: Duration,
    pub warning: Duration,
    pub status_report: Duration,
}

impl SweepIntervals {
    pub fn from_config(config: &SubscriptionConfig) -> Self {
        Self {
            expiry: Duration::from_secs(config.expiry_sweep_interval_secs),
            removal_retry: Duration::from_secs(config.removal_retry_interval_secs),
            warning: Duration::from_secs(config.warning_sweep_interval_secs),
            status_report: Duration::from_secs(config.status_report_interval_secs),
        }
    }
}

/// Run `tick` every `period` (first tick immediately) until `shutdown` flips
/// to true or its sender is dropped. A running tick is allowed to finish.
pub fn spawn_periodic<F, Fut>(
    name: &'static str,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
    mut tick: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period.max(Duration::from_millis(1)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(sweep = name, period_secs = period.as_secs(), "Sweep scheduled");

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = interval.tick() => tick().await,
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!(sweep = name, "Sweep stopped");
    })
}

/// Spawn the expiry, removal-retry, warning and status-report sweeps
pub fn spawn_sweeps(
    ctx: Arc<ServiceContext>,
    intervals: SweepIntervals,
    shutdown: &watch::Receiver<bool>,
) -> Vec<JoinHandle<()>> {
    let expiry = {
        let ctx = Arc::clone(&ctx);
        spawn_periodic("expiry", intervals.expiry, shutdown.clone(), move || {
            let ctx = Arc::clone(&ctx);
            async move {
                match ReconciliationService::new(&ctx).expiry_sweep().await {
                    Ok(summary) if summary.processed > 0 => info!(?summary, "Expiry sweep"),
                    Ok(_) => debug!("Expiry sweep: nothing expired"),
                    Err(e) => error!(error = %e, "Expiry sweep failed"),
                }
            }
        })
    };

    let removal_retry = {
        let ctx = Arc::clone(&ctx);
        spawn_periodic("removal_retry", intervals.removal_retry, shutdown.clone(), move || {
            let ctx = Arc::clone(&ctx);
            async move {
                match ReconciliationService::new(&ctx).removal_retry_sweep().await {
                    Ok(summary) if summary.processed > 0 => info!(?summary, "Removal retry sweep"),
                    Ok(_) => debug!("Removal retry sweep: nothing pending"),
                    Err(e) => error!(error = %e, "Removal retry sweep failed"),
                }
            }
        })
    };

    let warning = {
        let ctx = Arc::clone(&ctx);
        spawn_periodic("warning", intervals.warning, shutdown.clone(), move || {
            let ctx = Arc::clone(&ctx);
            async move {
                match ReconciliationService::new(&ctx).warning_sweep().await {
                    Ok(summary) if summary.processed > 0 => info!(?summary, "Warning sweep"),
                    Ok(_) => debug!("Warning sweep: nothing due"),
                    Err(e) => error!(error = %e, "Warning sweep failed"),
                }
            }
        })
    };

    let status_report = spawn_periodic(
        "status_report",
        intervals.status_report,
        shutdown.clone(),
        move || {
            let ctx = Arc::clone(&ctx);
            async move {
                match ReconciliationService::new(&ctx).status_report().await {
                    Ok(report) => info!(active = report.active, lapsed = report.lapsed, "Subscription status"),
                    Err(e) => error!(error = %e, "Status report failed"),
                }
            }
        },
    );

    vec![expiry, removal_retry, warning, status_report]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_intervals_from_config() {
        let config = SubscriptionConfig {
            default_duration: club_core::RenewalDuration::from_secs(120).unwrap(),
            invite_ttl_secs: 86_400,
            warning_lead_secs: 3_600,
            expiry_sweep_interval_secs: 10,
            removal_retry_interval_secs: 30,
            warning_sweep_interval_secs: 60,
            status_report_interval_secs: 300,
        };
        let intervals = SweepIntervals::from_config(&config);
        assert_eq!(intervals.expiry, Duration::from_secs(10));
        assert_eq!(intervals.status_report, Duration::from_secs(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_ticks_until_shutdown() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(false);

        let counter = Arc::clone(&ticks);
        let handle = spawn_periodic("test", Duration::from_secs(10), rx, move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_secs(25)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);

        tx.send(true).unwrap();
        handle.await.unwrap();

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_stops_when_sender_dropped() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(false);

        let counter = Arc::clone(&ticks);
        let handle = spawn_periodic("test", Duration::from_secs(1), rx, move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });
        tokio::time::sleep(Duration::from_millis(1500)).await;
        drop(tx);

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        let stopped_at = ticks.load(Ordering::SeqCst);
        assert_eq!(stopped_at, 2);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), stopped_at);
    }
}
