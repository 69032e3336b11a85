//! Long-polling update source
//!
//! [`UpdatePoller::run`] owns the `getUpdates` offset, classifies every update
//! into an [`Inbound`] and forwards it over an mpsc channel. Failures back off
//! exponentially and the loop keeps going until shutdown is signalled.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::client::TelegramClient;
use crate::error::{TelegramError, TelegramResult};
use crate::updates::Inbound;

/// Poller configuration
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// `getUpdates` long-poll timeout in seconds
    pub timeout_secs: u64,
    /// First delay after a failed poll in milliseconds
    pub reconnect_delay_ms: u64,
    /// Cap for the exponential backoff
    pub max_backoff_ms: u64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            reconnect_delay_ms: 1000,
            max_backoff_ms: 60_000,
        }
    }
}

impl PollerConfig {
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Delay before the next attempt after `failures` consecutive errors
    fn backoff(&self, failures: u32, retry_after: Option<u64>) -> Duration {
        if let Some(secs) = retry_after {
            return Duration::from_secs(secs);
        }
        let factor = 1u64 << failures.saturating_sub(1).min(16);
        Duration::from_millis(
            self.reconnect_delay_ms
                .saturating_mul(factor)
                .min(self.max_backoff_ms),
        )
    }
}

/// Bot API update poller
pub struct UpdatePoller {
    client: Arc<TelegramClient>,
    config: PollerConfig,
    offset: Option<i64>,
}

impl UpdatePoller {
    pub fn new(client: Arc<TelegramClient>, config: PollerConfig) -> Self {
        Self {
            client,
            config,
            offset: None,
        }
    }

    /// Fetch one batch and advance the offset past it
    pub async fn poll_once(&mut self) -> TelegramResult<Vec<Inbound>> {
        let updates = self
            .client
            .get_updates(self.offset, self.config.timeout_secs)
            .await?;

        if let Some(last) = updates.iter().map(|u| u.update_id).max() {
            self.offset = Some(last + 1);
        }

        Ok(updates.into_iter().filter_map(Inbound::from_update).collect())
    }

    /// Poll until `shutdown` flips to true or the receiver side is dropped
    pub async fn run(mut self, tx: mpsc::Sender<Inbound>, mut shutdown: watch::Receiver<bool>) {
        info!(timeout_secs = self.config.timeout_secs, "Update poller started");
        let mut failures: u32 = 0;

        loop {
            if *shutdown.borrow() {
                break;
            }

            let batch = tokio::select! {
                result = self.poll_once() => result,
                _ = shutdown.changed() => break,
            };

            match batch {
                Ok(items) => {
                    failures = 0;
                    if !items.is_empty() {
                        debug!(count = items.len(), "Received updates");
                    }
                    for item in items {
                        if tx.send(item).await.is_err() {
                            info!("Update receiver dropped, poller stopping");
                            return;
                        }
                    }
                }
                Err(e) => {
                    failures = failures.saturating_add(1);
                    let retry_after = match &e {
                        TelegramError::Api { retry_after, .. } => *retry_after,
                        _ => None,
                    };
                    let delay = self.config.backoff(failures, retry_after);
                    if e.is_transient() {
                        warn!(error = %e, failures, delay_ms = delay.as_millis() as u64, "Polling failed, retrying");
                    } else {
                        error!(error = %e, failures, delay_ms = delay.as_millis() as u64, "Polling failed, retrying");
                    }

                    tokio::select! {
                        () = tokio::time::sleep(delay) => {}
                        _ = shutdown.changed() => break,
                    }
                }
            }
        }

        info!("Update poller stopped");
    }
}
