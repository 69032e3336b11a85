//! # club-core
//!
//! Domain layer for the paid community subscriptions: entities, value objects,
//! the expiry/renewal rules, the community registry, inbound membership events,
//! and the ports (repository and messenger traits) implemented by infrastructure.
//! This crate has zero dependencies on infrastructure (database, HTTP, bot API).

pub mod entities;
pub mod error;
pub mod events;
pub mod registry;
pub mod time;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    Community, CommunityParseError, Member, NewMember, Payment, PaymentStatus, SubscriptionState,
};
pub use error::DomainError;
pub use events::MembershipEvent;
pub use registry::{CommunityDefinition, CommunityRegistry};
pub use time::{
    compute_renewal, compute_renewal_at, is_active, is_active_at, to_instant, Clock, IntoInstant,
    ManualClock, RenewalDuration, SystemClock,
};
pub use traits::{
    Activation, GroupMessenger, MemberRepository, MemberStatus, MessengerError, MessengerResult,
    PaymentRepository, Registration, RepoResult, SubscriptionSummary,
};
pub use value_objects::{ExternalId, GroupId, Handle, IdentityKey, MemberId, PaymentId};
