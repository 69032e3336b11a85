//! # club-service
//!
//! Application layer: the subscription lifecycle, registration and payment
//! settlement, the reconciliation sweeps, membership arbitration and status
//! queries, plus the request/response DTOs shared by the API and the bot.

pub mod dto;
pub mod services;

#[cfg(test)]
pub(crate) mod test_support;

pub use services::{
    ActivationOutcome, ArbitrationDecision, ExpirySweepSummary, MembershipArbiter, PaymentService,
    ReconciliationService, RegistrationService, RemovalSweepSummary, ServiceContext,
    ServiceContextBuilder, ServiceError, ServiceResult, StatusReport,
    StatusService, SubscriptionService, SubscriptionSettings, WarningSweepSummary,
};
