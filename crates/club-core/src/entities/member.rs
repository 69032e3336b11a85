//! Member entity - one enrollment of a person in a community

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Community;
use crate::time::is_active_at;
use crate::value_objects::{ExternalId, Handle, IdentityKey, MemberId};

/// Lifecycle state derived from a member row at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionState {
    /// Registered, never activated
    Pending,
    /// Active flag set and expiry in the future
    Active,
    /// Previously activated, now lapsed (whether or not a sweep has run yet)
    Expired,
}

/// Member row (one per enrollment attempt)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub id: MemberId,
    pub handle: Handle,
    /// Unknown until the person interacts with the bot or is activated
    pub external_id: Option<ExternalId>,
    pub phone: String,
    pub community: Community,
    pub joined_at: DateTime<Utc>,
    /// `None` until the first activation
    pub expires_at: Option<DateTime<Utc>>,
    pub active: bool,
    /// Single-use invite link handed out at the last activation
    pub invite_link: Option<String>,
    pub expiry_warning_sent: bool,
    /// Deactivated but not yet confirmed removed from the external group
    pub removal_pending: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Member {
    /// Identity key for store lookups
    pub fn identity(&self) -> IdentityKey {
        IdentityKey::with_handle(self.handle.clone(), self.external_id)
    }

    /// Real-time validity, independent of the cached `active` flag
    #[inline]
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.active && is_active_at(self.expires_at, now)
    }

    /// Lapsed but still flagged active (awaiting the expiry sweep)
    #[inline]
    pub fn is_lapsed_at(&self, now: DateTime<Utc>) -> bool {
        self.active && !is_active_at(self.expires_at, now)
    }

    pub fn state_at(&self, now: DateTime<Utc>) -> SubscriptionState {
        if self.is_active_at(now) {
            SubscriptionState::Active
        } else if self.expires_at.is_none() {
            SubscriptionState::Pending
        } else {
            SubscriptionState::Expired
        }
    }

    /// Whole seconds until expiry (negative once lapsed)
    pub fn seconds_left(&self, now: DateTime<Utc>) -> Option<i64> {
        self.expires_at.map(|expires| (expires - now).num_seconds())
    }
}

/// Input for creating a member row at registration time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMember {
    pub handle: Handle,
    pub external_id: Option<ExternalId>,
    pub phone: String,
    pub community: Community,
}

impl NewMember {
    pub fn new(handle: Handle, phone: impl Into<String>, community: Community) -> Self {
        Self {
            handle,
            external_id: None,
            phone: phone.into(),
            community,
        }
    }

    pub fn with_external_id(mut self, external_id: Option<ExternalId>) -> Self {
        self.external_id = external_id;
        self
    }

    pub fn identity(&self) -> IdentityKey {
        IdentityKey::with_handle(self.handle.clone(), self.external_id)
    }
}
