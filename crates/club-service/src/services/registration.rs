//! Registration service
//!
//! Creates pending member rows and renewal orders. Nothing here activates a
//! subscription; that happens when the payment callback settles the order.

use tracing::{info, instrument};
use validator::Validate;

use club_core::{Community, DomainError, ExternalId, Handle, IdentityKey, MemberId, NewMember};

use crate::dto::{RegistrationRequest, RegistrationResponse};

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Registration service
pub struct RegistrationService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> RegistrationService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Register a new enrollment and open its pending payment
    #[instrument(skip(self, request), fields(community = %request.community))]
    pub async fn register(&self, request: RegistrationRequest) -> ServiceResult<RegistrationResponse> {
        request.validate()?;

        let handle = Handle::parse(&request.handle)?;
        let community: Community = request
            .community
            .parse()
            .map_err(|e: club_core::CommunityParseError| DomainError::UnknownCommunity(e.0))?;
        let external_id = request
            .external_id
            .as_deref()
            .map(ExternalId::parse)
            .transpose()?;

        let price = self
            .ctx
            .registry()
            .get(community)
            .map(|definition| definition.price)
            .ok_or_else(|| DomainError::UnknownCommunity(community.to_string()))?;

        let identity = IdentityKey::with_handle(handle.clone(), external_id);
        let existing = self
            .ctx
            .member_repo()
            .find_active_subscription(community, &identity, self.ctx.now())
            .await?;
        if existing.is_some() {
            return Err(DomainError::ActiveSubscriptionExists(community).into());
        }

        let new_member =
            NewMember::new(handle, request.phone.trim(), community).with_external_id(external_id);
        let registration = self
            .ctx
            .member_repo()
            .register(&new_member, price, &new_order_ref())
            .await?;

        info!(
            member_id = %registration.member.id,
            order_ref = %registration.payment.order_ref,
            amount = registration.payment.amount,
            "Registration created"
        );

        Ok(RegistrationResponse::from(&registration))
    }

    /// Open a renewal order on an existing member row
    #[instrument(skip(self))]
    pub async fn renew(&self, member_id: MemberId) -> ServiceResult<RegistrationResponse> {
        let member = self
            .ctx
            .member_repo()
            .find_by_id(member_id)
            .await?
            .ok_or(DomainError::MemberNotFound(member_id))?;

        // Paying for a row other than the one currently active would end in
        // a uniqueness conflict at settlement time
        let active = self
            .ctx
            .member_repo()
            .find_active_subscription(member.community, &member.identity(), self.ctx.now())
            .await?;
        if active.is_some_and(|active| active.id != member.id) {
            return Err(DomainError::ActiveSubscriptionExists(member.community).into());
        }

        let price = self
            .ctx
            .registry()
            .get(member.community)
            .map(|definition| definition.price)
            .ok_or_else(|| DomainError::UnknownCommunity(member.community.to_string()))?;

        let payment = self
            .ctx
            .payment_repo()
            .create_for_member(member.id, price, &new_order_ref())
            .await?;

        info!(member_id = %member.id, order_ref = %payment.order_ref, "Renewal order created");

        Ok(RegistrationResponse::from_parts(&member, &payment))
    }
}

fn new_order_ref() -> String {
    format!("order_{}", uuid::Uuid::new_v4())
}
