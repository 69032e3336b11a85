//! Repository implementations
//!
//! PostgreSQL implementations of the repository traits defined in club-core.

mod error;
mod member;
mod payment;
mod sql;

pub use member::PgMemberRepository;
pub use payment::PgPaymentRepository;
