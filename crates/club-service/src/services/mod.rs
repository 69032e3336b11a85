//! Business logic services
//!
//! Each service borrows the shared [`ServiceContext`] and implements one
//! group of use cases.

pub mod arbiter;
pub mod context;
pub mod error;
mod notices;
pub mod payment;
pub mod reconciliation;
pub mod registration;
pub mod status;
pub mod subscription;

pub use arbiter::{ArbitrationDecision, MembershipArbiter};
pub use context::{ServiceContext, ServiceContextBuilder, SubscriptionSettings};
pub use error::{ServiceError, ServiceResult};
pub use payment::PaymentService;
pub use reconciliation::{
    ExpirySweepSummary, ReconciliationService, RemovalSweepSummary, StatusReport,
    WarningSweepSummary,
};
pub use registration::RegistrationService;
pub use status::StatusService;
pub use subscription::{ActivationOutcome, SubscriptionService};
