//! Route handlers
//!
//! All HTTP request handlers organized by domain.

pub mod communities;
pub mod health;
pub mod members;
pub mod payments;
pub mod registrations;
