//! Messaging collaborator capability set
//!
//! The chat platform is reached only through [`GroupMessenger`]. Every call
//! may report that the user or membership is already gone; callers treat
//! [`MessengerError::NotFound`] as success-equivalent where that makes sense.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value_objects::{ExternalId, GroupId};

/// Result type for messenger operations
pub type MessengerResult<T> = Result<T, MessengerError>;

/// Membership status of a user in a group as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    Creator,
    Administrator,
    Member,
    Restricted,
    Left,
    Kicked,
}

impl MemberStatus {
    /// Currently inside the group
    pub const fn is_present(self) -> bool {
        matches!(
            self,
            Self::Creator | Self::Administrator | Self::Member | Self::Restricted
        )
    }

    /// Owners and admins are never removed by the sweeps
    pub const fn is_privileged(self) -> bool {
        matches!(self, Self::Creator | Self::Administrator)
    }
}

/// Messenger call failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessengerError {
    /// User, chat member or join request does not exist (already absent)
    #[error("not found: {0}")]
    NotFound(String),

    /// The platform refused the call (permissions, blocked bot, bad request)
    #[error("rejected: {0}")]
    Rejected(String),

    /// Transport failure or platform-side error
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// No answer within the bounded timeout; never treated as success
    #[error("timed out")]
    Timeout,
}

impl MessengerError {
    /// "Already absent" outcome that callers may count as success
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[async_trait]
pub trait GroupMessenger: Send + Sync {
    /// Create a single-use invite link valid until `expires_at`
    async fn create_invite(
        &self,
        group: GroupId,
        expires_at: DateTime<Utc>,
        name: &str,
    ) -> MessengerResult<String>;

    /// Invalidate an invite link that will never be handed out
    async fn revoke_invite(&self, group: GroupId, invite_link: &str) -> MessengerResult<()>;

    /// Current membership status of a user in a group
    async fn member_status(&self, group: GroupId, user: ExternalId) -> MessengerResult<MemberStatus>;

    /// Remove a user from a group without a permanent ban (ban then unban)
    async fn remove_member(&self, group: GroupId, user: ExternalId) -> MessengerResult<()>;

    /// Unban a user still banned by an interrupted removal
    async fn lift_ban(&self, group: GroupId, user: ExternalId) -> MessengerResult<()>;

    async fn approve_join_request(&self, group: GroupId, user: ExternalId) -> MessengerResult<()>;

    async fn decline_join_request(&self, group: GroupId, user: ExternalId) -> MessengerResult<()>;

    /// Direct message to a user
    async fn send_notice(&self, user: ExternalId, text: &str) -> MessengerResult<()>;
}
