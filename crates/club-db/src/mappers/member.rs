//! Member entity <-> model mapper

use club_core::entities::{Community, Member, NewMember};
use club_core::error::DomainError;
use club_core::traits::SubscriptionSummary;
use club_core::value_objects::{ExternalId, Handle, MemberId};

use super::payment::parse_status;
use crate::models::{MemberModel, MemberSummaryModel};

impl TryFrom<MemberModel> for Member {
    type Error = DomainError;

    fn try_from(model: MemberModel) -> Result<Self, Self::Error> {
        let handle = Handle::try_from(model.handle).map_err(|e| corrupt(model.id, &e))?;
        let community = model
            .community
            .parse::<Community>()
            .map_err(|e| corrupt(model.id, &e))?;

        Ok(Member {
            id: MemberId::new(model.id),
            handle,
            external_id: model.external_id.map(ExternalId::new),
            phone: model.phone,
            community,
            joined_at: model.joined_at,
            expires_at: model.expires_at,
            active: model.active,
            invite_link: model.invite_link,
            expiry_warning_sent: model.expiry_warning_sent,
            removal_pending: model.removal_pending,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

/// Convert a summary row into the domain summary
pub fn summary_from_model(model: MemberSummaryModel) -> Result<SubscriptionSummary, DomainError> {
    let latest_payment = model
        .latest_payment_status
        .as_deref()
        .map(parse_status)
        .transpose()?;

    Ok(SubscriptionSummary {
        member: Member::try_from(model.member)?,
        latest_payment,
    })
}

fn corrupt(id: i64, err: &dyn std::fmt::Display) -> DomainError {
    DomainError::DatabaseError(format!("corrupt member row {id}: {err}"))
}

/// Values bound when inserting a member row
pub struct MemberInsert<'a> {
    pub handle: &'a str,
    pub external_id: Option<i64>,
    pub phone: &'a str,
    pub community: &'static str,
}

impl<'a> MemberInsert<'a> {
    pub fn new(member: &'a NewMember) -> Self {
        Self {
            handle: member.handle.as_str(),
            external_id: member.external_id.map(ExternalId::into_inner),
            phone: &member.phone,
            community: member.community.as_str(),
        }
    }
}
