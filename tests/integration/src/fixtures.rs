//! Test fixtures and data generators
//!
//! Provides reusable test data and a messenger that records every call.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use club_core::{ExternalId, GroupId, GroupMessenger, MemberStatus, MessengerResult};

/// Unique suffix that survives reruns against the same database
pub fn unique_suffix() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..12].to_string()
}

/// Positive numeric identity unlikely to collide with earlier runs
pub fn unique_external_id() -> i64 {
    (uuid::Uuid::new_v4().as_u128() & 0x0000_7fff_ffff_ffff) as i64 + 1
}

/// Registration form body
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationBody {
    pub handle: String,
    pub phone: String,
    pub community: String,
    pub external_id: Option<String>,
}

impl RegistrationBody {
    pub fn unique(community: &str) -> Self {
        Self {
            handle: format!("@it_{}", unique_suffix()),
            phone: "+380501234567".to_string(),
            community: community.to_string(),
            external_id: Some(unique_external_id().to_string()),
        }
    }

    pub fn bare_handle(&self) -> &str {
        self.handle.trim_start_matches('@')
    }

    pub fn external_id(&self) -> Option<i64> {
        self.external_id.as_deref().and_then(|id| id.parse().ok())
    }
}

/// Payment gateway callback body
#[derive(Debug, Clone, Serialize)]
pub struct CallbackBody {
    pub order: String,
    pub status: String,
}

impl CallbackBody {
    pub fn success(order: &str) -> Self {
        Self {
            order: order.to_string(),
            status: "success".to_string(),
        }
    }

    pub fn failure(order: &str) -> Self {
        Self {
            order: order.to_string(),
            status: "failure".to_string(),
        }
    }
}

/// List envelope
#[derive(Debug, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

#[derive(Debug, Deserialize)]
pub struct CommunityItem {
    pub community: String,
    pub display_name: String,
    pub price: i64,
    pub duration_secs: i64,
}

#[derive(Debug, Deserialize)]
pub struct OrderResponse {
    pub member_id: i64,
    pub community: String,
    pub order_ref: String,
    pub amount: i64,
    pub payment_status: String,
}

#[derive(Debug, Deserialize)]
pub struct SettlementResponse {
    pub order_ref: String,
    pub payment_status: String,
    pub already_settled: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub invite_link: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusItem {
    pub community: String,
    pub state: String,
    pub active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub latest_payment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorItem,
}

#[derive(Debug, Deserialize)]
pub struct ErrorItem {
    pub code: String,
    pub message: String,
}

/// Messenger double: creates numbered invite links and records notices
#[derive(Debug, Default)]
pub struct RecordingMessenger {
    invites: Mutex<Vec<(GroupId, String)>>,
    notices: Mutex<Vec<(ExternalId, String)>>,
}

impl RecordingMessenger {
    pub fn invites_created(&self) -> usize {
        self.invites.lock().len()
    }

    pub fn notices_to(&self, user: i64) -> Vec<String> {
        self.notices
            .lock()
            .iter()
            .filter(|(to, _)| to.into_inner() == user)
            .map(|(_, text)| text.clone())
            .collect()
    }
}

#[async_trait]
impl GroupMessenger for RecordingMessenger {
    async fn create_invite(
        &self,
        group: GroupId,
        _expires_at: DateTime<Utc>,
        _name: &str,
    ) -> MessengerResult<String> {
        let mut invites = self.invites.lock();
        let link = format!("https://t.me/+it{}x{}", group.into_inner().abs(), invites.len() + 1);
        invites.push((group, link.clone()));
        Ok(link)
    }

    async fn revoke_invite(&self, _group: GroupId, _invite_link: &str) -> MessengerResult<()> {
        Ok(())
    }

    async fn member_status(&self, _group: GroupId, _user: ExternalId) -> MessengerResult<MemberStatus> {
        Ok(MemberStatus::Left)
    }

    async fn remove_member(&self, _group: GroupId, _user: ExternalId) -> MessengerResult<()> {
        Ok(())
    }

    async fn lift_ban(&self, _group: GroupId, _user: ExternalId) -> MessengerResult<()> {
        Ok(())
    }

    async fn approve_join_request(&self, _group: GroupId, _user: ExternalId) -> MessengerResult<()> {
        Ok(())
    }

    async fn decline_join_request(&self, _group: GroupId, _user: ExternalId) -> MessengerResult<()> {
        Ok(())
    }

    async fn send_notice(&self, user: ExternalId, text: &str) -> MessengerResult<()> {
        self.notices.lock().push((user, text.to_string()));
        Ok(())
    }
}
