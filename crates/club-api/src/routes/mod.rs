//! Route definitions
//!
//! All API routes organized by domain and mounted under /api/v1.

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{communities, health, members, payments, registrations};
use crate::state::AppState;

/// Create the main API router (health routes are mounted separately)
pub fn create_router() -> Router<AppState> {
    Router::new().nest("/api/v1", api_v1_routes())
}

/// Health check routes (exported separately to bypass rate limiting)
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
}

/// API v1 routes
fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .merge(catalog_routes())
        .merge(registration_routes())
        .merge(payment_routes())
        .merge(member_routes())
}

fn catalog_routes() -> Router<AppState> {
    Router::new().route("/communities", get(communities::list_communities))
}

fn registration_routes() -> Router<AppState> {
    Router::new()
        .route("/registrations", post(registrations::register))
        .route("/members/:member/renewals", post(registrations::renew))
}

fn payment_routes() -> Router<AppState> {
    Router::new().route("/payments/callback", post(payments::payment_callback))
}

fn member_routes() -> Router<AppState> {
    Router::new().route("/members/:member/subscriptions", get(members::get_subscriptions))
}
