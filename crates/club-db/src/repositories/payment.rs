//! PostgreSQL implementation of PaymentRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use club_core::entities::Payment;
use club_core::error::DomainError;
use club_core::traits::{PaymentRepository, RepoResult};
use club_core::value_objects::{MemberId, PaymentId};

use crate::models::PaymentModel;

use super::error::{map_db_error, map_unique_violation, member_not_found};
use super::sql::payment_columns;

/// PostgreSQL implementation of PaymentRepository
#[derive(Clone)]
pub struct PgPaymentRepository {
    pool: PgPool,
}

impl PgPaymentRepository {
    /// Create a new PgPaymentRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentRepository for PgPaymentRepository {
    #[instrument(skip(self))]
    async fn find_by_order_ref(&self, order_ref: &str) -> RepoResult<Option<Payment>> {
        let result = sqlx::query_as::<_, PaymentModel>(concat!(
            "SELECT ",
            payment_columns!(),
            " FROM payments WHERE order_ref = $1"
        ))
        .bind(order_ref)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(Payment::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn create_for_member(
        &self,
        member_id: MemberId,
        amount: i64,
        order_ref: &str,
    ) -> RepoResult<Payment> {
        let model = sqlx::query_as::<_, PaymentModel>(concat!(
            "INSERT INTO payments (member_id, amount, order_ref) VALUES ($1, $2, $3) RETURNING ",
            payment_columns!()
        ))
        .bind(member_id.into_inner())
        .bind(amount)
        .bind(order_ref)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if e.as_database_error()
                .is_some_and(|db_err| db_err.is_foreign_key_violation())
            {
                return member_not_found(member_id);
            }
            map_unique_violation(e, || {
                DomainError::ValidationError(format!("order reference {order_ref} already used"))
            })
        })?;

        Payment::try_from(model)
    }

    #[instrument(skip(self))]
    async fn mark_failed(&self, id: PaymentId) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE payments SET status = 'failed', updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(id.into_inner())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn latest_for_member(&self, member_id: MemberId) -> RepoResult<Option<Payment>> {
        let result = sqlx::query_as::<_, PaymentModel>(concat!(
            "SELECT ",
            payment_columns!(),
            " FROM payments WHERE member_id = $1 ORDER BY created_at DESC, id DESC LIMIT 1"
        ))
        .bind(member_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(Payment::try_from).transpose()
    }
}
