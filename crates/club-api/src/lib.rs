//! # club-api
//!
//! REST API server built with Axum framework.
//!
//! Exposes the community catalog, registration and renewal orders, the
//! payment callback and the per-member status check.

pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod server;
pub mod state;

pub use server::{create_app, create_app_state, create_app_state_with_messenger, run, run_server};
pub use state::AppState;
