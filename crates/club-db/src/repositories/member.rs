//! PostgreSQL implementation of MemberRepository

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use tracing::{debug, instrument};

use club_core::entities::{Community, Member, NewMember, Payment};
use club_core::error::DomainError;
use club_core::traits::{
    Activation, MemberRepository, Registration, RepoResult, SubscriptionSummary,
};
use club_core::value_objects::{ExternalId, Handle, IdentityKey, MemberId};

use crate::mappers::{summary_from_model, MemberInsert};
use crate::models::{MemberModel, MemberSummaryModel, PaymentModel};

use super::error::{map_db_error, map_unique_violation, member_not_found};
use super::sql::{has_completed_payment, identity_match, member_columns, payment_columns};

/// Bind values for [`identity_match!`]
fn identity_binds(identity: &IdentityKey) -> (Option<i64>, Option<String>) {
    (
        identity.external_id().map(ExternalId::into_inner),
        identity.handle().map(|h| h.as_str().to_string()),
    )
}

fn to_members(models: Vec<MemberModel>) -> RepoResult<Vec<Member>> {
    models.into_iter().map(Member::try_from).collect()
}

/// PostgreSQL implementation of MemberRepository
#[derive(Clone)]
pub struct PgMemberRepository {
    pool: PgPool,
}

impl PgMemberRepository {
    /// Create a new PgMemberRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MemberRepository for PgMemberRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: MemberId) -> RepoResult<Option<Member>> {
        let result = sqlx::query_as::<_, MemberModel>(concat!(
            "SELECT ",
            member_columns!(),
            " FROM members m WHERE m.id = $1"
        ))
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(Member::try_from).transpose()
    }

    #[instrument(skip(self), fields(identity = %identity))]
    async fn find_active_subscription(
        &self,
        community: Community,
        identity: &IdentityKey,
        now: DateTime<Utc>,
    ) -> RepoResult<Option<Member>> {
        let (external_id, handle) = identity_binds(identity);

        let result = sqlx::query_as::<_, MemberModel>(concat!(
            "SELECT ",
            member_columns!(),
            " FROM members m WHERE m.community = $3 AND m.active AND m.expires_at > $4 AND ",
            identity_match!(),
            " AND ",
            has_completed_payment!(),
            " ORDER BY m.expires_at DESC, m.id DESC LIMIT 1"
        ))
        .bind(external_id)
        .bind(handle)
        .bind(community.as_str())
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(Member::try_from).transpose()
    }

    #[instrument(skip(self), fields(identity = %identity))]
    async fn find_latest_per_community(
        &self,
        identity: &IdentityKey,
    ) -> RepoResult<Vec<SubscriptionSummary>> {
        let (external_id, handle) = identity_binds(identity);

        let results = sqlx::query_as::<_, MemberSummaryModel>(concat!(
            "SELECT DISTINCT ON (m.community) ",
            member_columns!(),
            ", lp.status AS latest_payment_status \
             FROM members m \
             LEFT JOIN LATERAL ( \
                 SELECT p.status FROM payments p WHERE p.member_id = m.id \
                 ORDER BY p.created_at DESC, p.id DESC LIMIT 1 \
             ) lp ON TRUE \
             WHERE ",
            identity_match!(),
            " ORDER BY m.community, m.expires_at DESC NULLS LAST, m.id DESC"
        ))
        .bind(external_id)
        .bind(handle)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        let mut summaries = results
            .into_iter()
            .map(summary_from_model)
            .collect::<RepoResult<Vec<_>>>()?;
        summaries.sort_by_key(|s| s.member.community);

        Ok(summaries)
    }

    #[instrument(skip(self))]
    async fn find_expired_active(&self, now: DateTime<Utc>) -> RepoResult<Vec<Member>> {
        // One row per (community, identity), keeping the latest expiry, then
        // the most overdue first
        let results = sqlx::query_as::<_, MemberModel>(concat!(
            "SELECT m.* FROM ( \
                 SELECT DISTINCT ON (m.community, COALESCE('ext:' || m.external_id::TEXT, 'handle:' || m.handle)) ",
            member_columns!(),
            " FROM members m \
                 WHERE m.active AND m.expires_at IS NOT NULL AND m.expires_at <= $1 AND ",
            has_completed_payment!(),
            " ORDER BY m.community, COALESCE('ext:' || m.external_id::TEXT, 'handle:' || m.handle), m.expires_at DESC \
             ) m \
             ORDER BY m.expires_at ASC, m.id ASC"
        ))
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        to_members(results)
    }

    #[instrument(skip(self))]
    async fn find_soon_expiring(
        &self,
        now: DateTime<Utc>,
        window: Duration,
    ) -> RepoResult<Vec<Member>> {
        let results = sqlx::query_as::<_, MemberModel>(concat!(
            "SELECT ",
            member_columns!(),
            " FROM members m \
             WHERE m.active AND NOT m.expiry_warning_sent \
               AND m.expires_at > $1 AND m.expires_at <= $2 AND ",
            has_completed_payment!(),
            " ORDER BY m.expires_at ASC, m.id ASC"
        ))
        .bind(now)
        .bind(now + window)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        to_members(results)
    }

    #[instrument(skip(self))]
    async fn find_pending_removals(&self) -> RepoResult<Vec<Member>> {
        let results = sqlx::query_as::<_, MemberModel>(concat!(
            "SELECT ",
            member_columns!(),
            " FROM members m \
             WHERE m.removal_pending AND NOT m.active AND m.external_id IS NOT NULL \
               AND NOT EXISTS ( \
                   SELECT 1 FROM members o \
                   WHERE o.active AND o.id <> m.id AND o.community = m.community \
                     AND (o.external_id = m.external_id OR o.handle = m.handle) \
               ) \
             ORDER BY m.updated_at ASC, m.id ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        to_members(results)
    }

    #[instrument(skip(self))]
    async fn list_active(&self) -> RepoResult<Vec<Member>> {
        let results = sqlx::query_as::<_, MemberModel>(concat!(
            "SELECT ",
            member_columns!(),
            " FROM members m WHERE m.active ORDER BY m.expires_at ASC NULLS LAST, m.id ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        to_members(results)
    }

    #[instrument(skip(self, member), fields(handle = %member.handle, community = %member.community))]
    async fn register(
        &self,
        member: &NewMember,
        amount: i64,
        order_ref: &str,
    ) -> RepoResult<Registration> {
        let insert = MemberInsert::new(member);
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let member_model = sqlx::query_as::<_, MemberModel>(concat!(
            "INSERT INTO members AS m (handle, external_id, phone, community) \
             VALUES ($1, $2, $3, $4) RETURNING ",
            member_columns!()
        ))
        .bind(insert.handle)
        .bind(insert.external_id)
        .bind(insert.phone)
        .bind(insert.community)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_db_error)?;

        let payment_model = sqlx::query_as::<_, PaymentModel>(concat!(
            "INSERT INTO payments (member_id, amount, order_ref) VALUES ($1, $2, $3) RETURNING ",
            payment_columns!()
        ))
        .bind(member_model.id)
        .bind(amount)
        .bind(order_ref)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            map_unique_violation(e, || {
                DomainError::ValidationError(format!("order reference {order_ref} already used"))
            })
        })?;

        tx.commit().await.map_err(map_db_error)?;

        Ok(Registration {
            member: Member::try_from(member_model)?,
            payment: Payment::try_from(payment_model)?,
        })
    }

    #[instrument(skip(self))]
    async fn deactivate(&self, id: MemberId, now: DateTime<Utc>) -> RepoResult<bool> {
        // Re-confirm expiry in the same statement so a concurrent renewal wins
        let result = sqlx::query(
            r#"
            UPDATE members
            SET active = FALSE,
                invite_link = NULL,
                expiry_warning_sent = FALSE,
                removal_pending = (external_id IS NOT NULL),
                updated_at = NOW()
            WHERE id = $1 AND active AND expires_at IS NOT NULL AND expires_at <= $2
            "#,
        )
        .bind(id.into_inner())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn mark_warned(&self, id: MemberId) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE members SET expiry_warning_sent = TRUE, updated_at = NOW() WHERE id = $1
            "#,
        )
        .bind(id.into_inner())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(member_not_found(id));
        }

        Ok(())
    }

    #[instrument(skip(self, activation), fields(member_id = %activation.member_id))]
    async fn apply_activation(&self, activation: &Activation) -> RepoResult<Member> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        if let Some(payment_id) = activation.settle_payment {
            let claimed = sqlx::query(
                r#"
                UPDATE payments SET status = 'completed', updated_at = NOW()
                WHERE id = $1 AND member_id = $2 AND status = 'pending'
                "#,
            )
            .bind(payment_id.into_inner())
            .bind(activation.member_id.into_inner())
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;

            if claimed.rows_affected() == 0 {
                return Err(DomainError::PaymentAlreadySettled(payment_id));
            }
        }

        let current = sqlx::query_as::<_, MemberModel>(concat!(
            "SELECT ",
            member_columns!(),
            " FROM members m WHERE m.id = $1 FOR UPDATE"
        ))
        .bind(activation.member_id.into_inner())
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_db_error)?
        .ok_or_else(|| member_not_found(activation.member_id))?;

        let community = current
            .community
            .parse::<Community>()
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;
        let external_id = activation
            .external_id
            .map(ExternalId::into_inner)
            .or(current.external_id);

        // Retire lapsed active rows of the same person and drop stale removal
        // requests, so neither blocks the new activation nor kicks the renewed member
        let superseded = sqlx::query(concat!(
            "UPDATE members m \
             SET active = FALSE, invite_link = NULL, expiry_warning_sent = FALSE, \
                 removal_pending = FALSE, updated_at = NOW() \
             WHERE m.id <> $3 AND m.community = $4 AND m.active \
               AND (m.expires_at IS NULL OR m.expires_at <= $5) AND ",
            identity_match!()
        ))
        .bind(external_id)
        .bind(&current.handle)
        .bind(current.id)
        .bind(&current.community)
        .bind(activation.now)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        sqlx::query(concat!(
            "UPDATE members m SET removal_pending = FALSE, updated_at = NOW() \
             WHERE m.community = $3 AND m.removal_pending AND ",
            identity_match!()
        ))
        .bind(external_id)
        .bind(&current.handle)
        .bind(&current.community)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        let updated = sqlx::query_as::<_, MemberModel>(concat!(
            "UPDATE members m \
             SET active = TRUE, \
                 expires_at = GREATEST(m.expires_at, $2), \
                 invite_link = COALESCE($3, m.invite_link), \
                 external_id = COALESCE($4, m.external_id), \
                 expiry_warning_sent = FALSE, \
                 removal_pending = FALSE, \
                 updated_at = NOW() \
             WHERE m.id = $1 RETURNING ",
            member_columns!()
        ))
        .bind(current.id)
        .bind(activation.expires_at)
        .bind(activation.invite_link.as_deref())
        .bind(activation.external_id.map(ExternalId::into_inner))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, || DomainError::ActiveSubscriptionExists(community)))?;

        tx.commit().await.map_err(map_db_error)?;

        debug!(
            superseded = superseded.rows_affected(),
            expires_at = ?updated.expires_at,
            "Activation applied"
        );

        Member::try_from(updated)
    }

    #[instrument(skip(self, invite_link))]
    async fn set_invite_link(&self, id: MemberId, invite_link: &str) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE members SET invite_link = $2, updated_at = NOW() WHERE id = $1
            "#,
        )
        .bind(id.into_inner())
        .bind(invite_link)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(member_not_found(id));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn clear_pending_removal(&self, id: MemberId) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE members SET removal_pending = FALSE, updated_at = NOW() WHERE id = $1
            "#,
        )
        .bind(id.into_inner())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(member_not_found(id));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn link_external_id(&self, handle: &Handle, external_id: ExternalId) -> RepoResult<u64> {
        // Skip rows whose community already has an active row for this id,
        // which would trip the active-uniqueness index
        let result = sqlx::query(
            r#"
            UPDATE members m SET external_id = $2, updated_at = NOW()
            WHERE m.handle = $1 AND m.external_id IS NULL
              AND NOT (m.active AND EXISTS (
                  SELECT 1 FROM members o
                  WHERE o.active AND o.community = m.community AND o.external_id = $2
              ))
            "#,
        )
        .bind(handle.as_str())
        .bind(external_id.into_inner())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected())
    }
}
