//! Inbound dispatcher
//!
//! Routes classified updates: commands are answered on their own task so a
//! slow reply never holds up the queue; membership events are forwarded in
//! order to the arbiter.

use std::sync::Arc;

use club_core::{ExternalId, MembershipEvent};
use club_service::{MembershipArbiter, ServiceContext};
use club_telegram::{CommandRequest, Inbound};
use futures_util::Stream;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::handlers::CommandHandler;

/// Inbound dispatcher
pub struct Dispatcher {
    ctx: Arc<ServiceContext>,
    membership_tx: mpsc::Sender<MembershipEvent>,
}

impl Dispatcher {
    pub fn new(ctx: Arc<ServiceContext>, membership_tx: mpsc::Sender<MembershipEvent>) -> Self {
        Self { ctx, membership_tx }
    }

    /// Drain `inbound` until every sender is gone
    pub async fn run(self, mut inbound: mpsc::Receiver<Inbound>) {
        info!("Dispatcher started");

        while let Some(item) = inbound.recv().await {
            match item {
                Inbound::Command(request) => {
                    let ctx = Arc::clone(&self.ctx);
                    tokio::spawn(async move { answer(&ctx, request).await });
                }
                Inbound::Membership(event) => {
                    if self.membership_tx.send(event).await.is_err() {
                        warn!("Arbiter stopped, dispatcher exiting");
                        break;
                    }
                }
            }
        }

        info!("Dispatcher stopped");
    }
}

/// Run a command and send the reply back to its private chat
pub async fn answer(ctx: &ServiceContext, request: CommandRequest) {
    let text = CommandHandler::new(ctx).handle(&request).await;

    // In a private chat the chat id is the user's own id
    let chat = ExternalId::new(request.chat_id);
    match ctx.call_messenger(ctx.messenger().send_notice(chat, &text)).await {
        Ok(()) => debug!(chat = %chat, "Reply sent"),
        Err(e) => warn!(chat = %chat, error = %e, "Reply not delivered"),
    }
}

/// Receiver as a stream that ends once all senders are dropped
pub fn membership_stream(
    rx: mpsc::Receiver<MembershipEvent>,
) -> impl Stream<Item = MembershipEvent> + Send {
    futures_util::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|event| (event, rx))
    })
}

/// Arbitrate membership events until the channel closes
pub async fn run_arbiter(ctx: Arc<ServiceContext>, rx: mpsc::Receiver<MembershipEvent>) {
    MembershipArbiter::new(&ctx).run(membership_stream(rx)).await;
}
