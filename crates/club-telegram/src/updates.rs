//! Update classification
//!
//! Each `getUpdates` item becomes at most one [`Inbound`]: a command typed in
//! a private chat with the bot, or a membership event for some group.

use club_core::{ExternalId, GroupId, MembershipEvent};

use crate::types::{ChatJoinRequest, ChatMemberUpdated, Message, Update};

/// Bot command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/start` with an optional deep-link payload
    Start(Option<String>),
    Check,
    Help,
    Id,
    Unknown(String),
}

impl Command {
    /// Parse the first token of a message text; `None` if it is not a command
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let rest = text.strip_prefix('/')?;
        let (token, args) = match rest.split_once(char::is_whitespace) {
            Some((token, args)) => (token, args.trim()),
            None => (rest, ""),
        };
        // Commands in groups may be addressed as /cmd@bot_name
        let name = token.split('@').next().unwrap_or(token).to_lowercase();

        let command = match name.as_str() {
            "start" => Self::Start((!args.is_empty()).then(|| args.to_string())),
            "check" => Self::Check,
            "help" => Self::Help,
            "id" => Self::Id,
            _ => Self::Unknown(name),
        };
        Some(command)
    }
}

/// Command together with who sent it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub chat_id: i64,
    pub user: ExternalId,
    pub handle: Option<String>,
    pub first_name: String,
    pub command: Command,
}

/// Classified update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Command(CommandRequest),
    Membership(MembershipEvent),
}

impl Inbound {
    pub fn from_update(update: Update) -> Option<Self> {
        if let Some(request) = update.chat_join_request {
            return Some(Self::Membership(join_request(request)));
        }
        if let Some(change) = update.chat_member {
            return status_change(change).map(Self::Membership);
        }
        update.message.and_then(command).map(Self::Command)
    }
}

fn join_request(request: ChatJoinRequest) -> MembershipEvent {
    MembershipEvent::JoinRequest {
        group: GroupId::new(request.chat.id),
        user: ExternalId::new(request.from.id),
        handle: request.from.username,
    }
}

fn status_change(change: ChatMemberUpdated) -> Option<MembershipEvent> {
    let old = change.old_chat_member.member_status()?;
    let new = change.new_chat_member.member_status()?;
    let user = change.new_chat_member.user;
    if user.is_bot {
        return None;
    }

    Some(MembershipEvent::StatusChanged {
        group: GroupId::new(change.chat.id),
        user: ExternalId::new(user.id),
        handle: user.username,
        old,
        new,
    })
}

fn command(message: Message) -> Option<CommandRequest> {
    if !message.chat.is_private() {
        return None;
    }
    let from = message.from?;
    let command = Command::parse(message.text.as_deref()?)?;

    Some(CommandRequest {
        chat_id: message.chat.id,
        user: ExternalId::new(from.id),
        handle: from.username,
        first_name: from.first_name,
        command,
    })
}
