//! Payment entity <-> model mapper

use club_core::entities::{Payment, PaymentStatus};
use club_core::error::DomainError;
use club_core::value_objects::{MemberId, PaymentId};

use crate::models::PaymentModel;

/// Parse a stored payment status
pub fn parse_status(raw: &str) -> Result<PaymentStatus, DomainError> {
    raw.parse::<PaymentStatus>().map_err(DomainError::DatabaseError)
}

impl TryFrom<PaymentModel> for Payment {
    type Error = DomainError;

    fn try_from(model: PaymentModel) -> Result<Self, Self::Error> {
        Ok(Payment {
            id: PaymentId::new(model.id),
            member_id: MemberId::new(model.member_id),
            amount: model.amount,
            status: parse_status(&model.status)?,
            order_ref: model.order_ref,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
