//! Payment database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for the payments table
#[derive(Debug, Clone, FromRow)]
pub struct PaymentModel {
    pub id: i64,
    pub member_id: i64,
    pub amount: i64,
    pub status: String,
    pub order_ref: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
