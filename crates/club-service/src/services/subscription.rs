//! Subscription lifecycle service
//!
//! Activation and renewal share one path: compute the next expiry from the
//! row's current expiry, ask the messenger for an invite (best-effort), then
//! persist everything in a single store transaction.

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use club_core::traits::Activation;
use club_core::{
    compute_renewal_at, Community, DomainError, ExternalId, Handle, Member, MemberId, PaymentId,
};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Result of a successful activation or renewal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationOutcome {
    pub member: Member,
    pub expires_at: DateTime<Utc>,
    pub invite_link: Option<String>,
}

/// Subscription lifecycle service
pub struct SubscriptionService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> SubscriptionService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Activate or renew the member row `member_id`.
    ///
    /// Only call this after a completed payment has been confirmed; it does
    /// not look at payments itself.
    #[instrument(skip(self))]
    pub async fn activate(
        &self,
        member_id: MemberId,
        handle: &Handle,
        community: Community,
        external_id: Option<ExternalId>,
    ) -> ServiceResult<ActivationOutcome> {
        let member = self
            .ctx
            .member_repo()
            .find_by_id(member_id)
            .await?
            .ok_or(DomainError::MemberNotFound(member_id))?;

        if member.handle != *handle || member.community != community {
            return Err(ServiceError::validation(
                "handle and community do not match the member row",
            ));
        }

        self.activate_member(&member, external_id, None).await
    }

    /// Shared activation path. With `settle_payment` the pending payment is
    /// claimed as completed in the same transaction as the activation.
    pub(crate) async fn activate_member(
        &self,
        member: &Member,
        external_id: Option<ExternalId>,
        settle_payment: Option<PaymentId>,
    ) -> ServiceResult<ActivationOutcome> {
        let now = self.ctx.now();
        let duration = self.ctx.registry().duration_for(member.community);
        let next_expiry = compute_renewal_at(member.expires_at, duration, now);

        let invite_link = match self.create_invite(member, next_expiry).await {
            Ok(link) => Some(link),
            Err(e) => {
                warn!(member_id = %member.id, error = %e, "Invite creation failed, activating without a new link");
                None
            }
        };

        let activation = Activation {
            member_id: member.id,
            expires_at: next_expiry,
            invite_link,
            external_id: external_id.or(member.external_id),
            settle_payment,
            now,
        };
        let activated = match self.ctx.member_repo().apply_activation(&activation).await {
            Ok(activated) => activated,
            Err(e) => {
                if let Some(link) = &activation.invite_link {
                    self.discard_invite(member, link).await;
                }
                return Err(e.into());
            }
        };

        // A concurrent renewal may have pushed the stored expiry further out
        let expires_at = activated.expires_at.unwrap_or(next_expiry);
        info!(
            member_id = %activated.id,
            community = %activated.community,
            expires_at = %expires_at,
            has_invite = activated.invite_link.is_some(),
            "Subscription activated"
        );

        Ok(ActivationOutcome {
            expires_at,
            invite_link: activated.invite_link.clone(),
            member: activated,
        })
    }

    /// Create a single-use invite for the member's group, valid for the
    /// configured TTL but never past `valid_until`
    pub async fn create_invite(
        &self,
        member: &Member,
        valid_until: DateTime<Utc>,
    ) -> ServiceResult<String> {
        let group = self.ctx.registry().group_for(member.community).ok_or_else(|| {
            ServiceError::internal(format!("no group configured for {}", member.community))
        })?;

        let expires_at = (self.ctx.now() + self.ctx.settings().invite_ttl).min(valid_until);
        let name = invite_name(member);

        let link = self
            .ctx
            .call_messenger(self.ctx.messenger().create_invite(group, expires_at, &name))
            .await?;
        Ok(link)
    }

    /// Best-effort revoke of an invite whose activation was rejected
    async fn discard_invite(&self, member: &Member, invite_link: &str) {
        let Some(group) = self.ctx.registry().group_for(member.community) else {
            return;
        };
        match self
            .ctx
            .call_messenger(self.ctx.messenger().revoke_invite(group, invite_link))
            .await
        {
            Ok(()) => debug!(member_id = %member.id, "Unused invite revoked"),
            Err(e) => warn!(
                member_id = %member.id,
                error = %e,
                "Activation rejected and its invite could not be revoked"
            ),
        }
    }
}

/// Invite names are capped at 32 characters by the platform
fn invite_name(member: &Member) -> String {
    format!("{} @{}", member.community, member.handle)
        .chars()
        .take(32)
        .collect()
}
