//! Ports implemented by infrastructure crates

mod messenger;
mod repositories;

pub use messenger::{GroupMessenger, MemberStatus, MessengerError, MessengerResult};
pub use repositories::{
    Activation, MemberRepository, PaymentRepository, Registration, RepoResult,
    SubscriptionSummary,
};
