//! Database models - SQLx-compatible structs for PostgreSQL tables

mod member;
mod payment;

pub use member::{MemberModel, MemberSummaryModel};
pub use payment::PaymentModel;
