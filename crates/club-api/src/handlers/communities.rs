//! Community catalog handler

use axum::{extract::State, Json};
use club_service::dto::{ApiResponse, CommunityResponse};
use club_service::StatusService;

use crate::state::AppState;

/// List the communities on offer with their prices
///
/// GET /communities
pub async fn list_communities(State(state): State<AppState>) -> Json<ApiResponse<Vec<CommunityResponse>>> {
    let service = StatusService::new(state.service_context());
    Json(ApiResponse::new(service.catalog()))
}
