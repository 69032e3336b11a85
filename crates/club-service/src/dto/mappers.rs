//! Entity to DTO mappers

use chrono::{DateTime, Utc};

use club_core::traits::{Registration, SubscriptionSummary};
use club_core::{CommunityDefinition, CommunityRegistry, Member, Payment};

use super::responses::{
    CommunityResponse, RegistrationResponse, SubscriptionStatusResponse,
};

impl CommunityResponse {
    /// Catalog entry with the effective renewal length
    pub fn from_definition(definition: &CommunityDefinition, registry: &CommunityRegistry) -> Self {
        Self {
            community: definition.community,
            display_name: definition.display_name.clone(),
            price: definition.price,
            duration_secs: registry.duration_for(definition.community).as_secs(),
        }
    }
}

impl RegistrationResponse {
    pub fn from_parts(member: &Member, payment: &Payment) -> Self {
        Self {
            member_id: member.id,
            community: member.community,
            order_ref: payment.order_ref.clone(),
            amount: payment.amount,
            payment_status: payment.status,
        }
    }
}

impl From<&Registration> for RegistrationResponse {
    fn from(registration: &Registration) -> Self {
        Self::from_parts(&registration.member, &registration.payment)
    }
}

impl SubscriptionStatusResponse {
    /// Render a summary as seen at `now`
    pub fn from_summary(
        summary: &SubscriptionSummary,
        registry: &CommunityRegistry,
        now: DateTime<Utc>,
    ) -> Self {
        let member = &summary.member;
        let display_name = registry
            .get(member.community)
            .map_or_else(|| member.community.to_string(), |d| d.display_name.clone());
        let active = member.is_active_at(now);

        Self {
            community: member.community,
            display_name,
            state: member.state_at(now),
            active,
            expires_at: member.expires_at,
            seconds_left: member.seconds_left(now).filter(|_| active),
            latest_payment: summary.latest_payment,
        }
    }
}
