//! Payment gateway callback handler

use axum::{extract::State, Json};
use club_service::dto::{PaymentCallbackRequest, SettlementResponse};
use club_service::PaymentService;

use crate::extractors::ValidatedJson;
use crate::response::ApiResult;
use crate::state::AppState;

/// Settle a payment. Repeated callbacks for a settled order are answered
/// with `already_settled: true` and change nothing.
///
/// POST /payments/callback
pub async fn payment_callback(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<PaymentCallbackRequest>,
) -> ApiResult<Json<SettlementResponse>> {
    let service = PaymentService::new(state.service_context());
    let response = service.settle(request).await?;
    Ok(Json(response))
}
