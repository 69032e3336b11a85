//! Payment settlement
//!
//! The gateway callback may arrive more than once for the same order. The
//! first callback settles the payment (and activates on success); later ones
//! report the settled state without side effects.

use tracing::{info, instrument, warn};
use validator::Validate;

use club_core::{DomainError, Payment, PaymentStatus};

use crate::dto::{PaymentCallbackRequest, PaymentOutcome, SettlementResponse};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::notices;
use super::subscription::{ActivationOutcome, SubscriptionService};

/// Payment service
pub struct PaymentService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> PaymentService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Apply a gateway callback
    #[instrument(skip(self, request), fields(order_ref = %request.order, outcome = ?request.status))]
    pub async fn settle(&self, request: PaymentCallbackRequest) -> ServiceResult<SettlementResponse> {
        request.validate()?;

        let payment = self
            .ctx
            .payment_repo()
            .find_by_order_ref(&request.order)
            .await?
            .ok_or_else(|| DomainError::PaymentNotFound(request.order.clone()))?;

        if payment.status.is_terminal() {
            info!(status = %payment.status.as_str(), "Callback for an already settled payment");
            return self.already_settled(payment).await;
        }

        match request.status {
            PaymentOutcome::Failure => self.fail(payment).await,
            PaymentOutcome::Success => self.complete(payment).await,
        }
    }

    async fn fail(&self, payment: Payment) -> ServiceResult<SettlementResponse> {
        if !self.ctx.payment_repo().mark_failed(payment.id).await? {
            return self.reload_settled(&payment.order_ref).await;
        }

        info!(payment_id = %payment.id, "Payment failed");
        Ok(SettlementResponse {
            order_ref: payment.order_ref,
            payment_status: PaymentStatus::Failed,
            already_settled: false,
            expires_at: None,
            invite_link: None,
        })
    }

    async fn complete(&self, payment: Payment) -> ServiceResult<SettlementResponse> {
        let member = self
            .ctx
            .member_repo()
            .find_by_id(payment.member_id)
            .await?
            .ok_or(DomainError::MemberNotFound(payment.member_id))?;

        let outcome = match SubscriptionService::new(self.ctx)
            .activate_member(&member, None, Some(payment.id))
            .await
        {
            Ok(outcome) => outcome,
            // Lost the race against a concurrent replay of this callback
            Err(ServiceError::Domain(DomainError::PaymentAlreadySettled(_))) => {
                return self.reload_settled(&payment.order_ref).await;
            }
            Err(e) => return Err(e),
        };

        self.notify_activation(&outcome).await;

        Ok(SettlementResponse {
            order_ref: payment.order_ref,
            payment_status: PaymentStatus::Completed,
            already_settled: false,
            expires_at: Some(outcome.expires_at),
            invite_link: outcome.invite_link,
        })
    }

    async fn reload_settled(&self, order_ref: &str) -> ServiceResult<SettlementResponse> {
        let payment = self
            .ctx
            .payment_repo()
            .find_by_order_ref(order_ref)
            .await?
            .ok_or_else(|| DomainError::PaymentNotFound(order_ref.to_string()))?;
        self.already_settled(payment).await
    }

    async fn already_settled(&self, payment: Payment) -> ServiceResult<SettlementResponse> {
        let member = if payment.status == PaymentStatus::Completed {
            self.ctx.member_repo().find_by_id(payment.member_id).await?
        } else {
            None
        };

        Ok(SettlementResponse {
            order_ref: payment.order_ref,
            payment_status: payment.status,
            already_settled: true,
            expires_at: member.as_ref().and_then(|m| m.expires_at),
            invite_link: member.and_then(|m| m.invite_link),
        })
    }

    /// Best-effort direct message with the new expiry and invite
    async fn notify_activation(&self, outcome: &ActivationOutcome) {
        let Some(user) = outcome.member.external_id else {
            return;
        };
        let display_name = self
            .ctx
            .registry()
            .get(outcome.member.community)
            .map_or_else(|| outcome.member.community.to_string(), |d| d.display_name.clone());

        let text = notices::activation(&display_name, outcome.expires_at, outcome.invite_link.as_deref());
        if let Err(e) = self
            .ctx
            .call_messenger(self.ctx.messenger().send_notice(user, &text))
            .await
        {
            warn!(member_id = %outcome.member.id, error = %e, "Activation notice not delivered");
        }
    }
}
