//! Bot API HTTP client
//!
//! Every method is a JSON `POST` to `{api_url}/bot{token}/{method}`. The API
//! answers with an `{ok, result}` envelope even on HTTP errors, so the body
//! is decoded before the status is considered.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use club_common::TelegramConfig;
use club_core::{ExternalId, GroupId, GroupMessenger, MemberStatus, MessengerError, MessengerResult};

use crate::error::{TelegramError, TelegramResult};
use crate::types::{
    ApiResponse, BanChatMember, ChatInviteLink, ChatMember, ChatUser, CreateChatInviteLink,
    GetUpdates, RevokeChatInviteLink, SendMessage, UnbanChatMember, Update, User,
};

/// Update kinds the poller subscribes to
const ALLOWED_UPDATES: &[&str] = &["message", "chat_join_request", "chat_member"];

/// Pause between ban and unban so the platform registers the removal
const UNBAN_DELAY: Duration = Duration::from_secs(1);

/// Removal bans expire on their own after this long, so an unban lost to a
/// timeout cannot lock the user out. The platform treats anything under 30s
/// as permanent.
const REMOVAL_BAN_TTL_SECS: i64 = 60;

/// Telegram Bot API client
#[derive(Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    api_base_url: String,
    token: String,
}

impl fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramClient")
            .field("api_base_url", &self.api_base_url)
            .field("token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl TelegramClient {
    /// Create a client with a per-request timeout
    pub fn new(
        token: impl Into<String>,
        api_base_url: impl Into<String>,
        timeout: Duration,
    ) -> TelegramResult<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(TelegramError::Setup("bot token must not be empty".to_string()));
        }

        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .build()
            .map_err(|e| TelegramError::Setup(e.to_string()))?;

        Ok(Self {
            http,
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn from_config(config: &TelegramConfig) -> TelegramResult<Self> {
        Self::new(
            config.bot_token.clone(),
            config.api_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base_url, self.token, method)
    }

    async fn call<P, R>(&self, method: &str, payload: &P) -> TelegramResult<R>
    where
        P: Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        self.call_with_timeout(method, payload, None).await
    }

    async fn call_with_timeout<P, R>(
        &self,
        method: &str,
        payload: &P,
        timeout: Option<Duration>,
    ) -> TelegramResult<R>
    where
        P: Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        let mut request = self.http.post(self.method_url(method)).json(payload);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        decode_response(method, status.as_u16(), &body)
    }

    /// Identity of the bot itself; used as a startup credential check
    #[instrument(skip(self))]
    pub async fn get_me(&self) -> TelegramResult<User> {
        self.call("getMe", &serde_json::json!({})).await
    }

    /// Long-poll for updates. The HTTP timeout is stretched past the poll
    /// timeout so an idle poll is not reported as a transport failure.
    pub async fn get_updates(&self, offset: Option<i64>, timeout_secs: u64) -> TelegramResult<Vec<Update>> {
        let payload = GetUpdates {
            offset,
            timeout: timeout_secs,
            allowed_updates: ALLOWED_UPDATES,
        };
        self.call_with_timeout(
            "getUpdates",
            &payload,
            Some(Duration::from_secs(timeout_secs + 10)),
        )
        .await
    }

    #[instrument(skip(self, text))]
    pub async fn send_message(&self, chat_id: i64, text: &str) -> TelegramResult<()> {
        let payload = SendMessage {
            chat_id,
            text,
            disable_web_page_preview: true,
        };
        let _: serde_json::Value = self.call("sendMessage", &payload).await?;
        Ok(())
    }

    async fn ban(&self, group: GroupId, user: ExternalId) -> TelegramResult<bool> {
        let payload = removal_ban(group, user, Utc::now());
        self.call("banChatMember", &payload).await
    }

    async fn unban(&self, group: GroupId, user: ExternalId) -> TelegramResult<bool> {
        let payload = UnbanChatMember {
            chat_id: group.into_inner(),
            user_id: user.into_inner(),
            only_if_banned: true,
        };
        self.call("unbanChatMember", &payload).await
    }
}

fn removal_ban(group: GroupId, user: ExternalId, now: DateTime<Utc>) -> BanChatMember {
    BanChatMember {
        chat_id: group.into_inner(),
        user_id: user.into_inner(),
        until_date: now.timestamp() + REMOVAL_BAN_TTL_SECS,
    }
}

fn decode_response<R: DeserializeOwned>(method: &str, status: u16, body: &str) -> TelegramResult<R> {
    let envelope: ApiResponse<R> = serde_json::from_str(body).map_err(|e| {
        TelegramError::Decode(format!("{method} returned HTTP {status} with unreadable body: {e}"))
    })?;

    if envelope.ok {
        return envelope
            .result
            .ok_or_else(|| TelegramError::Decode(format!("{method} returned ok without a result")));
    }

    Err(TelegramError::Api {
        code: envelope.error_code.unwrap_or(status),
        description: envelope
            .description
            .unwrap_or_else(|| "no description".to_string()),
        retry_after: envelope.parameters.and_then(|p| p.retry_after),
    })
}

#[async_trait]
impl GroupMessenger for TelegramClient {
    #[instrument(skip(self, name))]
    async fn create_invite(
        &self,
        group: GroupId,
        expires_at: DateTime<Utc>,
        name: &str,
    ) -> MessengerResult<String> {
        let payload = CreateChatInviteLink {
            chat_id: group.into_inner(),
            name,
            expire_date: expires_at.timestamp(),
            member_limit: 1,
            creates_join_request: false,
        };
        let link: ChatInviteLink = self.call("createChatInviteLink", &payload).await?;
        Ok(link.invite_link)
    }

    #[instrument(skip(self, invite_link))]
    async fn revoke_invite(&self, group: GroupId, invite_link: &str) -> MessengerResult<()> {
        let payload = RevokeChatInviteLink {
            chat_id: group.into_inner(),
            invite_link,
        };
        let _: ChatInviteLink = self.call("revokeChatInviteLink", &payload).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn member_status(&self, group: GroupId, user: ExternalId) -> MessengerResult<MemberStatus> {
        let payload = ChatUser {
            chat_id: group.into_inner(),
            user_id: user.into_inner(),
        };
        let member: ChatMember = self.call("getChatMember", &payload).await?;
        member
            .member_status()
            .ok_or_else(|| MessengerError::Rejected(format!("unknown member status '{}'", member.status)))
    }

    #[instrument(skip(self))]
    async fn remove_member(&self, group: GroupId, user: ExternalId) -> MessengerResult<()> {
        self.ban(group, user).await?;
        tokio::time::sleep(UNBAN_DELAY).await;

        // The ban already removed the user; a failed unban only leaves them
        // unable to rejoin with a fresh invite, so it is logged not returned.
        if let Err(e) = self.unban(group, user).await {
            warn!(error = %e, "Unban after removal failed");
        }
        debug!("Member removed from group");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn lift_ban(&self, group: GroupId, user: ExternalId) -> MessengerResult<()> {
        self.unban(group, user).await?;
        debug!("Leftover ban lifted");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn approve_join_request(&self, group: GroupId, user: ExternalId) -> MessengerResult<()> {
        let payload = ChatUser {
            chat_id: group.into_inner(),
            user_id: user.into_inner(),
        };
        let _: bool = self.call("approveChatJoinRequest", &payload).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn decline_join_request(&self, group: GroupId, user: ExternalId) -> MessengerResult<()> {
        let payload = ChatUser {
            chat_id: group.into_inner(),
            user_id: user.into_inner(),
        };
        let _: bool = self.call("declineChatJoinRequest", &payload).await?;
        Ok(())
    }

    async fn send_notice(&self, user: ExternalId, text: &str) -> MessengerResult<()> {
        self.send_message(user.into_inner(), text).await?;
        Ok(())
    }
}
