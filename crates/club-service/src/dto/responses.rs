//! Response DTOs for API endpoints
//!
//! All response DTOs implement `Serialize` for JSON output.

use chrono::{DateTime, Utc};
use serde::Serialize;

use club_core::{Community, MemberId, PaymentStatus, SubscriptionState};

/// Generic API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

// ============================================================================
// Catalog
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct CommunityResponse {
    pub community: Community,
    pub display_name: String,
    pub price: i64,
    /// Renewal length in seconds (community-specific or the global fallback)
    pub duration_secs: i64,
}

// ============================================================================
// Registration and payments
// ============================================================================

/// Pending registration or renewal order awaiting payment
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationResponse {
    pub member_id: MemberId,
    pub community: Community,
    pub order_ref: String,
    pub amount: i64,
    pub payment_status: PaymentStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct SettlementResponse {
    pub order_ref: String,
    pub payment_status: PaymentStatus,
    /// True when the callback repeated an already settled payment
    pub already_settled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invite_link: Option<String>,
}

// ============================================================================
// Status
// ============================================================================

/// One community's row in a status check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriptionStatusResponse {
    pub community: Community,
    pub display_name: String,
    pub state: SubscriptionState,
    pub active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub seconds_left: Option<i64>,
    pub latest_payment: Option<PaymentStatus>,
}

/// Invite handed out on `/start`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveredInvite {
    pub community: Community,
    pub display_name: String,
    pub expires_at: Option<DateTime<Utc>>,
    /// `None` when a fresh link could not be created right now
    pub invite_link: Option<String>,
}

// ============================================================================
// Health Responses
// ============================================================================

/// Basic health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Readiness check response
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub checks: HealthChecks,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthChecks {
    pub database: String,
}

impl ReadinessResponse {
    pub fn ready(database_healthy: bool) -> Self {
        Self {
            status: if database_healthy { "ready" } else { "not_ready" }.to_string(),
            timestamp: Utc::now(),
            checks: HealthChecks {
                database: if database_healthy { "healthy" } else { "unhealthy" }.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settlement_skips_missing_fields() {
        let response = SettlementResponse {
            order_ref: "order_1".to_string(),
            payment_status: PaymentStatus::Failed,
            already_settled: false,
            expires_at: None,
            invite_link: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["payment_status"], "failed");
        assert!(json.get("invite_link").is_none());
    }

    #[test]
    fn test_readiness() {
        assert_eq!(ReadinessResponse::ready(true).status, "ready");
        let not_ready = ReadinessResponse::ready(false);
        assert_eq!(not_ready.status, "not_ready");
        assert_eq!(not_ready.checks.database, "unhealthy");
    }
}
