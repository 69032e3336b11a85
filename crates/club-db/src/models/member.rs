//! Member database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for the members table
#[derive(Debug, Clone, FromRow)]
pub struct MemberModel {
    pub id: i64,
    pub handle: String,
    pub external_id: Option<i64>,
    pub phone: String,
    pub community: String,
    pub joined_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub active: bool,
    pub invite_link: Option<String>,
    pub expiry_warning_sent: bool,
    pub removal_pending: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Member row joined with the status of its most recent payment
#[derive(Debug, Clone, FromRow)]
pub struct MemberSummaryModel {
    #[sqlx(flatten)]
    pub member: MemberModel,
    pub latest_payment_status: Option<String>,
}
