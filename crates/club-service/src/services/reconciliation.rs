//! Reconciliation sweeps
//!
//! Each sweep evaluates every row against a single `now` taken at the start
//! of the tick and processes rows in the order the store returns them
//! (soonest expiry first). A failure on one row is logged and counted; the
//! sweep moves on to the next row. Only a failed initial query aborts a tick.

use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use club_core::{Member, MemberStatus, MessengerError};

use super::context::ServiceContext;
use super::error::ServiceResult;
use super::notices;

/// Counters of one expiry sweep tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExpirySweepSummary {
    pub processed: usize,
    pub deactivated: usize,
    pub removed: usize,
    pub failed: usize,
}

/// Counters of one removal retry tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RemovalSweepSummary {
    pub processed: usize,
    pub removed: usize,
    pub failed: usize,
}

/// Counters of one warning sweep tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WarningSweepSummary {
    pub processed: usize,
    pub notified: usize,
    pub failed: usize,
}

/// Snapshot of the active rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub active: usize,
    /// Flagged active but already past expiry (waiting for the expiry sweep)
    pub lapsed: usize,
}

/// How an external removal attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Removal {
    /// Removed from the group by this call
    Removed,
    /// Not in the group (left, or unknown to the platform)
    AlreadyAbsent,
    /// Owner or admin; never removed
    Privileged,
    /// The identity holds a valid subscription again
    Renewed,
    /// Transient or unexpected failure; retried on a later tick
    Failed,
}

impl Removal {
    fn is_settled(self) -> bool {
        !matches!(self, Self::Failed)
    }

    fn counts_as_removed(self) -> bool {
        matches!(self, Self::Removed | Self::AlreadyAbsent)
    }
}

/// Reconciliation service
pub struct ReconciliationService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ReconciliationService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Deactivate every lapsed row and remove its owner from the group
    #[instrument(skip(self))]
    pub async fn expiry_sweep(&self) -> ServiceResult<ExpirySweepSummary> {
        let now = self.ctx.now();
        let expired = self.ctx.member_repo().find_expired_active(now).await?;
        let mut summary = ExpirySweepSummary::default();

        for member in expired {
            summary.processed += 1;

            match self.ctx.member_repo().deactivate(member.id, now).await {
                Ok(true) => summary.deactivated += 1,
                Ok(false) => {
                    debug!(member_id = %member.id, "Row changed since the query, skipping");
                    continue;
                }
                Err(e) => {
                    error!(member_id = %member.id, error = %e, "Deactivation failed");
                    summary.failed += 1;
                    continue;
                }
            }
            debug!(member_id = %member.id, community = %member.community, "Subscription deactivated");

            if member.external_id.is_none() {
                continue;
            }
            let removal = self.enforce_removal(&member).await;
            if removal.counts_as_removed() {
                summary.removed += 1;
            } else if !removal.is_settled() {
                summary.failed += 1;
            }
        }

        if summary.processed > 0 {
            info!(
                processed = summary.processed,
                deactivated = summary.deactivated,
                removed = summary.removed,
                failed = summary.failed,
                "Expiry sweep finished"
            );
        }
        Ok(summary)
    }

    /// Retry group removal for deactivated rows still flagged as pending
    #[instrument(skip(self))]
    pub async fn removal_retry_sweep(&self) -> ServiceResult<RemovalSweepSummary> {
        let pending = self.ctx.member_repo().find_pending_removals().await?;
        let mut summary = RemovalSweepSummary::default();

        for member in pending {
            summary.processed += 1;
            let removal = self.enforce_removal(&member).await;
            if removal.counts_as_removed() {
                summary.removed += 1;
            } else if !removal.is_settled() {
                summary.failed += 1;
            }
        }

        if summary.processed > 0 {
            info!(
                processed = summary.processed,
                removed = summary.removed,
                failed = summary.failed,
                "Removal retry sweep finished"
            );
        }
        Ok(summary)
    }

    /// Send the one-time warning to rows expiring within the lead window
    #[instrument(skip(self))]
    pub async fn warning_sweep(&self) -> ServiceResult<WarningSweepSummary> {
        let now = self.ctx.now();
        let lead = self.ctx.settings().warning_lead;
        let expiring = self.ctx.member_repo().find_soon_expiring(now, lead).await?;
        let mut summary = WarningSweepSummary::default();

        for member in expiring {
            summary.processed += 1;

            if let (Some(user), Some(expires_at)) = (member.external_id, member.expires_at) {
                let text = notices::expiry_warning(&self.display_name(&member), expires_at);
                match self
                    .ctx
                    .call_messenger(self.ctx.messenger().send_notice(user, &text))
                    .await
                {
                    Ok(()) => summary.notified += 1,
                    Err(e) => warn!(member_id = %member.id, error = %e, "Expiry warning not delivered"),
                }
            }

            // At most one attempt per period, delivered or not
            if let Err(e) = self.ctx.member_repo().mark_warned(member.id).await {
                error!(member_id = %member.id, error = %e, "Failed to mark warning as sent");
                summary.failed += 1;
            }
        }

        if summary.processed > 0 {
            info!(
                processed = summary.processed,
                notified = summary.notified,
                failed = summary.failed,
                "Warning sweep finished"
            );
        }
        Ok(summary)
    }

    /// Log the active rows with the time each one has left
    #[instrument(skip(self))]
    pub async fn status_report(&self) -> ServiceResult<StatusReport> {
        let now = self.ctx.now();
        let active = self.ctx.member_repo().list_active().await?;
        let mut report = StatusReport::default();

        for member in &active {
            let seconds_left = member.seconds_left(now).unwrap_or_default();
            if member.is_lapsed_at(now) {
                report.lapsed += 1;
            } else {
                report.active += 1;
            }
            debug!(
                member_id = %member.id,
                handle = %member.handle,
                community = %member.community,
                seconds_left,
                "Active subscription"
            );
        }

        info!(active = report.active, lapsed = report.lapsed, "Subscription status report");
        Ok(report)
    }

    /// Remove a deactivated row's owner from the group, then clear the
    /// pending flag and notify them unless the attempt failed
    async fn enforce_removal(&self, member: &Member) -> Removal {
        let removal = self.attempt_removal(member).await;

        if removal.is_settled() {
            if let Err(e) = self.ctx.member_repo().clear_pending_removal(member.id).await {
                error!(member_id = %member.id, error = %e, "Failed to clear pending removal");
                return Removal::Failed;
            }
        }

        if removal.counts_as_removed() {
            if let Some(user) = member.external_id {
                let text = notices::removal(&self.display_name(member));
                if let Err(e) = self
                    .ctx
                    .call_messenger(self.ctx.messenger().send_notice(user, &text))
                    .await
                {
                    debug!(member_id = %member.id, error = %e, "Removal notice not delivered");
                }
            }
        }

        debug!(member_id = %member.id, outcome = ?removal, "Removal processed");
        removal
    }

    async fn attempt_removal(&self, member: &Member) -> Removal {
        let Some(user) = member.external_id else {
            return Removal::AlreadyAbsent;
        };
        let Some(group) = self.ctx.registry().group_for(member.community) else {
            error!(community = %member.community, "No group configured, cannot remove member");
            return Removal::Failed;
        };

        // A renewal may have landed between the query and now
        match self
            .ctx
            .member_repo()
            .find_active_subscription(member.community, &member.identity(), self.ctx.now())
            .await
        {
            Ok(Some(_)) => return Removal::Renewed,
            Ok(None) => {}
            Err(e) => {
                error!(member_id = %member.id, error = %e, "Renewal re-check failed");
                return Removal::Failed;
            }
        }

        let messenger = self.ctx.messenger();
        match self.ctx.call_messenger(messenger.member_status(group, user)).await {
            Ok(status) if status.is_privileged() => return Removal::Privileged,
            // Left banned by an earlier attempt that timed out before its unban
            Ok(MemberStatus::Kicked) => {
                return match self.ctx.call_messenger(messenger.lift_ban(group, user)).await {
                    Ok(()) => Removal::Removed,
                    Err(e) if e.is_absent() => Removal::AlreadyAbsent,
                    Err(e) => {
                        log_removal_failure(member, &e);
                        Removal::Failed
                    }
                };
            }
            Ok(status) if !status.is_present() => return Removal::AlreadyAbsent,
            Ok(_) => {}
            Err(e) if e.is_absent() => return Removal::AlreadyAbsent,
            Err(e) => {
                log_removal_failure(member, &e);
                return Removal::Failed;
            }
        }

        match self.ctx.call_messenger(messenger.remove_member(group, user)).await {
            Ok(()) => Removal::Removed,
            Err(e) if e.is_absent() => Removal::AlreadyAbsent,
            Err(e) => {
                log_removal_failure(member, &e);
                Removal::Failed
            }
        }
    }

    fn display_name(&self, member: &Member) -> String {
        self.ctx
            .registry()
            .get(member.community)
            .map_or_else(|| member.community.to_string(), |d| d.display_name.clone())
    }
}

fn log_removal_failure(member: &Member, err: &MessengerError) {
    warn!(
        member_id = %member.id,
        community = %member.community,
        error = %err,
        "Group removal failed, will retry"
    );
}
