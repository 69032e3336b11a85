//! Member status handler

use axum::{
    extract::{Path, Query, State},
    Json,
};
use club_service::dto::{ApiResponse, SubscriptionStatusResponse};
use club_service::StatusService;

use crate::extractors::{MemberPath, StatusQuery};
use crate::response::ApiResult;
use crate::state::AppState;

/// Latest subscription per community for a person
///
/// GET /members/{handle}/subscriptions?external_id=...
pub async fn get_subscriptions(
    State(state): State<AppState>,
    Path(path): Path<MemberPath>,
    Query(query): Query<StatusQuery>,
) -> ApiResult<Json<ApiResponse<Vec<SubscriptionStatusResponse>>>> {
    let identity = query.identity(&path)?;

    let service = StatusService::new(state.service_context());
    let statuses = service.check(&identity).await?;
    Ok(Json(ApiResponse::new(statuses)))
}
