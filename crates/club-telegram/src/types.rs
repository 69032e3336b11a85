//! Bot API wire types
//!
//! Only the fields this adapter reads are modelled; unknown fields are ignored.

use serde::{Deserialize, Serialize};

use club_core::MemberStatus;

/// Response envelope shared by every method
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<u16>,
    pub parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseParameters {
    pub retry_after: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub first_name: String,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

impl Chat {
    pub fn is_private(&self) -> bool {
        self.kind == "private"
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatJoinRequest {
    pub chat: Chat,
    pub from: User,
    pub date: i64,
}

/// `ChatMember` union, flattened to the fields shared by its variants
#[derive(Debug, Clone, Deserialize)]
pub struct ChatMember {
    pub status: String,
    pub user: User,
    /// Only present for `restricted`
    pub is_member: Option<bool>,
}

impl ChatMember {
    /// Map the platform status string; `restricted` users who left count as `Left`
    pub fn member_status(&self) -> Option<MemberStatus> {
        let status = match self.status.as_str() {
            "creator" => MemberStatus::Creator,
            "administrator" => MemberStatus::Administrator,
            "member" => MemberStatus::Member,
            "restricted" if self.is_member == Some(false) => MemberStatus::Left,
            "restricted" => MemberStatus::Restricted,
            "left" => MemberStatus::Left,
            "kicked" => MemberStatus::Kicked,
            _ => return None,
        };
        Some(status)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatMemberUpdated {
    pub chat: Chat,
    pub from: User,
    pub date: i64,
    pub old_chat_member: ChatMember,
    pub new_chat_member: ChatMember,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub chat_join_request: Option<ChatJoinRequest>,
    pub chat_member: Option<ChatMemberUpdated>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatInviteLink {
    pub invite_link: String,
}

// ============================================================================
// Request payloads
// ============================================================================

#[derive(Debug, Serialize)]
pub struct GetUpdates<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    pub timeout: u64,
    pub allowed_updates: &'a [&'a str],
}

#[derive(Debug, Serialize)]
pub struct CreateChatInviteLink<'a> {
    pub chat_id: i64,
    pub name: &'a str,
    pub expire_date: i64,
    pub member_limit: u32,
    pub creates_join_request: bool,
}

#[derive(Debug, Serialize)]
pub struct RevokeChatInviteLink<'a> {
    pub chat_id: i64,
    pub invite_link: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ChatUser {
    pub chat_id: i64,
    pub user_id: i64,
}

/// `until_date` is a unix timestamp; the platform lifts the ban on its own
/// once it passes
#[derive(Debug, Serialize)]
pub struct BanChatMember {
    pub chat_id: i64,
    pub user_id: i64,
    pub until_date: i64,
}

#[derive(Debug, Serialize)]
pub struct UnbanChatMember {
    pub chat_id: i64,
    pub user_id: i64,
    pub only_if_banned: bool,
}

#[derive(Debug, Serialize)]
pub struct SendMessage<'a> {
    pub chat_id: i64,
    pub text: &'a str,
    pub disable_web_page_preview: bool,
}
