//! Value objects - immutable types that represent domain concepts

mod handle;
mod ids;
mod identity;

pub use handle::Handle;
pub use identity::IdentityKey;
pub use ids::{ExternalId, GroupId, MemberId, PaymentId};
