//! Integration test utilities for the club services
//!
//! This crate provides helpers for running end-to-end tests against
//! the REST API with a recording messenger in place of Telegram.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
