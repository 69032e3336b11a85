//! Registration and renewal handlers
//!
//! Both create a pending payment order; activation happens when the payment
//! callback reports success.

use axum::{
    extract::{Path, State},
    Json,
};
use club_service::dto::{RegistrationRequest, RegistrationResponse};
use club_service::RegistrationService;

use crate::extractors::{MemberPath, ValidatedJson};
use crate::response::{ApiResult, Created};
use crate::state::AppState;

/// Register for a community
///
/// POST /registrations
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RegistrationRequest>,
) -> ApiResult<Created<Json<RegistrationResponse>>> {
    let service = RegistrationService::new(state.service_context());
    let response = service.register(request).await?;
    Ok(Created(Json(response)))
}

/// Open a renewal order for an existing member row
///
/// POST /members/{member}/renewals
pub async fn renew(
    State(state): State<AppState>,
    Path(path): Path<MemberPath>,
) -> ApiResult<Created<Json<RegistrationResponse>>> {
    let member_id = path.member_id()?;

    let service = RegistrationService::new(state.service_context());
    let response = service.renew(member_id).await?;
    Ok(Created(Json(response)))
}
