//! Membership events
//!
//! The platform adapter turns whatever transport it uses (long polling,
//! webhooks) into a stream of these; the arbitration service consumes the
//! stream without knowing the transport.

use serde::{Deserialize, Serialize};

use crate::traits::MemberStatus;
use crate::value_objects::{ExternalId, GroupId};

/// Membership-related event reported by the messaging platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MembershipEvent {
    /// A user asked to join a group (invite links requiring approval)
    JoinRequest {
        group: GroupId,
        user: ExternalId,
        handle: Option<String>,
    },

    /// A user's membership status in a group changed
    StatusChanged {
        group: GroupId,
        user: ExternalId,
        handle: Option<String>,
        old: MemberStatus,
        new: MemberStatus,
    },
}

impl MembershipEvent {
    pub fn group(&self) -> GroupId {
        match self {
            Self::JoinRequest { group, .. } | Self::StatusChanged { group, .. } => *group,
        }
    }

    pub fn user(&self) -> ExternalId {
        match self {
            Self::JoinRequest { user, .. } | Self::StatusChanged { user, .. } => *user,
        }
    }

    pub fn handle(&self) -> Option<&str> {
        match self {
            Self::JoinRequest { handle, .. } | Self::StatusChanged { handle, .. } => {
                handle.as_deref()
            }
        }
    }

    /// Transition into the group (anything not present before, present now)
    pub fn is_arrival(&self) -> bool {
        match self {
            Self::JoinRequest { .. } => false,
            Self::StatusChanged { old, new, .. } => !old.is_present() && new.is_present(),
        }
    }
}
