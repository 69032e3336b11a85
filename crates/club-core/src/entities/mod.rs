//! Domain entities - core business objects

mod community;
mod member;
mod payment;

pub use community::{Community, CommunityParseError};
pub use member::{Member, NewMember, SubscriptionState};
pub use payment::{Payment, PaymentStatus};
