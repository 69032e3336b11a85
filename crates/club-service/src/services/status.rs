//! Status queries and invite re-delivery

use tracing::{debug, instrument, warn};

use club_core::{ExternalId, Handle, IdentityKey};

use crate::dto::{CommunityResponse, DeliveredInvite, SubscriptionStatusResponse};

use super::context::ServiceContext;
use super::error::ServiceResult;
use super::subscription::SubscriptionService;

/// Status service
pub struct StatusService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> StatusService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// The community catalog in display order
    pub fn catalog(&self) -> Vec<CommunityResponse> {
        let registry = self.ctx.registry();
        registry
            .all()
            .map(|definition| CommunityResponse::from_definition(definition, registry))
            .collect()
    }

    /// Latest row per community the identity ever touched
    #[instrument(skip(self), fields(identity = %identity))]
    pub async fn check(&self, identity: &IdentityKey) -> ServiceResult<Vec<SubscriptionStatusResponse>> {
        let now = self.ctx.now();
        let summaries = self
            .ctx
            .member_repo()
            .find_latest_per_community(identity)
            .await?;

        Ok(summaries
            .iter()
            .map(|summary| SubscriptionStatusResponse::from_summary(summary, self.ctx.registry(), now))
            .collect())
    }

    /// Invites for every active subscription of the caller.
    ///
    /// The stored invite is returned when there is one; otherwise a new one
    /// is created and persisted. A failed creation yields an entry without a
    /// link so the caller can ask again later.
    #[instrument(skip(self, handle))]
    pub async fn deliver_invites(
        &self,
        handle: Option<&Handle>,
        user: ExternalId,
    ) -> ServiceResult<Vec<DeliveredInvite>> {
        if let Some(handle) = handle {
            self.ctx.member_repo().link_external_id(handle, user).await?;
        }

        let identity = IdentityKey::from_parts(handle.cloned(), Some(user))?;
        let now = self.ctx.now();
        let subscriptions = SubscriptionService::new(self.ctx);
        let mut delivered = Vec::new();

        for definition in self.ctx.registry().all() {
            let Some(member) = self
                .ctx
                .member_repo()
                .find_active_subscription(definition.community, &identity, now)
                .await?
            else {
                continue;
            };

            let invite_link = match (&member.invite_link, member.expires_at) {
                (Some(link), _) => Some(link.clone()),
                (None, Some(expires_at)) => {
                    match subscriptions.create_invite(&member, expires_at).await {
                        Ok(link) => {
                            self.ctx.member_repo().set_invite_link(member.id, &link).await?;
                            debug!(member_id = %member.id, "Invite re-created");
                            Some(link)
                        }
                        Err(e) => {
                            warn!(member_id = %member.id, error = %e, "Invite re-delivery failed");
                            None
                        }
                    }
                }
                (None, None) => None,
            };

            delivered.push(DeliveredInvite {
                community: definition.community,
                display_name: definition.display_name.clone(),
                expires_at: member.expires_at,
                invite_link,
            });
        }

        Ok(delivered)
    }
}
