//! Repository traits (ports) - define the interface for data access
//!
//! The domain layer defines what it needs, and the infrastructure layer
//! provides the implementation. Time-dependent queries take an explicit `now`
//! so that one sweep tick evaluates every row against the same instant.
//!
//! Multi-statement operations (`register`, `apply_activation`) are atomic:
//! either every write commits or none does.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::entities::{Community, Member, NewMember, Payment, PaymentStatus};
use crate::error::DomainError;
use crate::value_objects::{ExternalId, Handle, IdentityKey, MemberId, PaymentId};

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

/// Everything `apply_activation` persists in one transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    pub member_id: MemberId,
    pub expires_at: DateTime<Utc>,
    pub invite_link: Option<String>,
    /// Recorded when first learned; an existing value is kept when `None`
    pub external_id: Option<ExternalId>,
    /// Pending payment to claim as completed in the same transaction.
    /// Fails with `PaymentAlreadySettled` if it is no longer pending.
    pub settle_payment: Option<PaymentId>,
    pub now: DateTime<Utc>,
}

/// Member and payment rows created together at registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub member: Member,
    pub payment: Payment,
}

/// Most relevant row of one community for a status query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionSummary {
    pub member: Member,
    pub latest_payment: Option<PaymentStatus>,
}

// ============================================================================
// Member Repository (the subscription store)
// ============================================================================

#[async_trait]
pub trait MemberRepository: Send + Sync {
    /// Find a member row by ID
    async fn find_by_id(&self, id: MemberId) -> RepoResult<Option<Member>>;

    /// The active subscription of an identity in a community: `active`, expiry
    /// later than `now`, and at least one completed payment. The most recent
    /// expiry wins when history holds several matches.
    async fn find_active_subscription(
        &self,
        community: Community,
        identity: &IdentityKey,
        now: DateTime<Utc>,
    ) -> RepoResult<Option<Member>>;

    /// For each community the identity ever touched, the row with the most
    /// recent expiry, annotated with that row's latest payment status
    async fn find_latest_per_community(
        &self,
        identity: &IdentityKey,
    ) -> RepoResult<Vec<SubscriptionSummary>>;

    /// Rows still flagged active whose expiry is at or before `now` and that
    /// have a completed payment, one per (identity, community), soonest
    /// expiry first
    async fn find_expired_active(&self, now: DateTime<Utc>) -> RepoResult<Vec<Member>>;

    /// Active rows expiring within `window` of `now`, not yet warned, with a
    /// completed payment
    async fn find_soon_expiring(
        &self,
        now: DateTime<Utc>,
        window: Duration,
    ) -> RepoResult<Vec<Member>>;

    /// Deactivated rows whose external group removal is not yet confirmed,
    /// skipping identities that currently hold another active row in the
    /// same community
    async fn find_pending_removals(&self) -> RepoResult<Vec<Member>>;

    /// All rows flagged active, soonest expiry first
    async fn list_active(&self) -> RepoResult<Vec<Member>>;

    /// Create a pending member row and its pending payment
    async fn register(
        &self,
        member: &NewMember,
        amount: i64,
        order_ref: &str,
    ) -> RepoResult<Registration>;

    /// Clear `active`, the invite link and the warning flag, and flag the
    /// row for external removal when it has an external id. Only touches a
    /// row that is still active with an expiry at or before `now`, so a
    /// renewal racing the sweep is never overwritten. Returns whether this
    /// call performed the transition.
    async fn deactivate(&self, id: MemberId, now: DateTime<Utc>) -> RepoResult<bool>;

    /// Set the one-shot warning flag (idempotent)
    async fn mark_warned(&self, id: MemberId) -> RepoResult<()>;

    /// Activate or renew: set `active`, the new expiry, invite link and
    /// identity, reset the warning flag and any pending removal. Lapsed
    /// active rows of the same identity and community are superseded first.
    /// A still-valid active row of the same identity in the same community
    /// fails with `ActiveSubscriptionExists`.
    async fn apply_activation(&self, activation: &Activation) -> RepoResult<Member>;

    /// Persist an invite link created after activation
    async fn set_invite_link(&self, id: MemberId, invite_link: &str) -> RepoResult<()>;

    /// Mark external removal as confirmed (idempotent)
    async fn clear_pending_removal(&self, id: MemberId) -> RepoResult<()>;

    /// Record the external id on rows registered under `handle` that do not
    /// have one yet. Returns the number of rows updated.
    async fn link_external_id(&self, handle: &Handle, external_id: ExternalId) -> RepoResult<u64>;
}

// ============================================================================
// Payment Repository
// ============================================================================

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Find a payment by its gateway order reference
    async fn find_by_order_ref(&self, order_ref: &str) -> RepoResult<Option<Payment>>;

    /// Create a pending payment for an existing member row
    async fn create_for_member(
        &self,
        member_id: MemberId,
        amount: i64,
        order_ref: &str,
    ) -> RepoResult<Payment>;

    /// Move a pending payment to `failed`. Returns false if it was not pending.
    async fn mark_failed(&self, id: PaymentId) -> RepoResult<bool>;

    /// Most recent payment of a member row
    async fn latest_for_member(&self, member_id: MemberId) -> RepoResult<Option<Payment>>;
}
