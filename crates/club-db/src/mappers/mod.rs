//! Row to entity mappers
//!
//! Stored text columns (handle, community, payment status) are re-validated on
//! the way out, so a corrupt row surfaces as a `DatabaseError` instead of a
//! malformed entity.

mod member;
mod payment;

pub use member::{summary_from_model, MemberInsert};
pub use payment::parse_status;
