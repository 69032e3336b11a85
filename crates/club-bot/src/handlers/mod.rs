//! Bot command handlers
//!
//! Each command produces exactly one reply text. Service failures are logged
//! and answered with a generic apology.

mod error;
pub mod replies;

pub use error::{HandlerError, HandlerResult};

use club_core::{Handle, IdentityKey};
use club_service::{ServiceContext, StatusService};
use club_telegram::{Command, CommandRequest};
use tracing::{info, instrument, warn};

/// Deep-link payload the registration page uses to ask for the numeric id
const GET_ID_PAYLOAD: &str = "get_id_";

/// Command handler
pub struct CommandHandler<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> CommandHandler<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Reply text for a command; never fails
    #[instrument(skip(self, request), fields(user = %request.user, command = ?request.command))]
    pub async fn handle(&self, request: &CommandRequest) -> String {
        if let Some(text) = static_reply(request) {
            return text;
        }

        let result = match request.command {
            Command::Check => self.check(request).await,
            _ => self.start(request).await,
        };

        result.unwrap_or_else(|e| {
            warn!(error = %e, "Command failed");
            replies::GENERIC_ERROR.to_string()
        })
    }

    /// `/start`: invites for active subscriptions, onboarding otherwise
    async fn start(&self, request: &CommandRequest) -> HandlerResult<String> {
        let handle = parse_handle(request);
        let delivered = StatusService::new(self.ctx)
            .deliver_invites(handle.as_ref(), request.user)
            .await?;

        if delivered.is_empty() {
            if handle.is_none() {
                return Ok(replies::MISSING_USERNAME.to_string());
            }
            return Ok(replies::onboarding(&StatusService::new(self.ctx).catalog()));
        }

        info!(subscriptions = delivered.len(), "Invites delivered");
        let ttl_hours = self.ctx.settings().invite_ttl.num_hours().max(1);
        Ok(replies::invites(&greeting_name(request), &delivered, ttl_hours))
    }

    /// `/check`: latest row per community
    async fn check(&self, request: &CommandRequest) -> HandlerResult<String> {
        let identity =
            IdentityKey::resolve(request.handle.as_deref(), Some(request.user.into_inner()))?;
        let statuses = StatusService::new(self.ctx).check(&identity).await?;
        Ok(replies::status(&statuses))
    }
}

/// Replies that need no store access
fn static_reply(request: &CommandRequest) -> Option<String> {
    let text = match &request.command {
        Command::Start(Some(payload)) if payload.starts_with(GET_ID_PAYLOAD) => {
            replies::your_id(&greeting_name(request), request.user.into_inner())
        }
        Command::Id => replies::your_id(&greeting_name(request), request.user.into_inner()),
        Command::Help => replies::HELP.to_string(),
        Command::Unknown(_) => replies::UNKNOWN_COMMAND.to_string(),
        Command::Start(_) | Command::Check => return None,
    };
    Some(text)
}

fn parse_handle(request: &CommandRequest) -> Option<Handle> {
    request
        .handle
        .as_deref()
        .and_then(|raw| Handle::parse(raw).ok())
}

fn greeting_name(request: &CommandRequest) -> String {
    if !request.first_name.trim().is_empty() {
        return request.first_name.trim().to_string();
    }
    match &request.handle {
        Some(handle) => format!("@{handle}"),
        None => "користувач".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use club_core::ExternalId;

    fn request(command: Command, handle: Option<&str>, first_name: &str) -> CommandRequest {
        CommandRequest {
            chat_id: 555,
            user: ExternalId::new(555),
            handle: handle.map(String::from),
            first_name: first_name.to_string(),
            command,
        }
    }

    #[test]
    fn test_static_replies() {
        let help = static_reply(&request(Command::Help, None, "")).unwrap();
        assert_eq!(help, replies::HELP);

        let id = static_reply(&request(Command::Id, Some("olena_k"), "")).unwrap();
        assert!(id.contains("@olena_k"));
        assert!(id.contains("555"));

        let unknown = static_reply(&request(Command::Unknown("foo".into()), None, "")).unwrap();
        assert_eq!(unknown, replies::UNKNOWN_COMMAND);
    }

    #[test]
    fn test_start_deep_link_answers_with_id() {
        let start = request(
            Command::Start(Some("get_id_https%3A%2F%2Fexample.org".into())),
            None,
            "Олена",
        );
        let text = static_reply(&start).unwrap();
        assert!(text.contains("Привіт, Олена!"));

        assert!(static_reply(&request(Command::Start(None), None, "")).is_none());
        assert!(static_reply(&request(Command::Start(Some("ref".into())), None, "")).is_none());
        assert!(static_reply(&request(Command::Check, None, "")).is_none());
    }

    #[test]
    fn test_parse_handle() {
        assert_eq!(
            parse_handle(&request(Command::Check, Some("Olena_K"), "")).map(|h| h.to_string()),
            Some("olena_k".to_string())
        );
        assert!(parse_handle(&request(Command::Check, Some("ab"), "")).is_none());
        assert!(parse_handle(&request(Command::Check, None, "")).is_none());
    }

    #[test]
    fn test_greeting_name_fallbacks() {
        assert_eq!(greeting_name(&request(Command::Id, Some("x_user"), " Ann ")), "Ann");
        assert_eq!(greeting_name(&request(Command::Id, Some("x_user"), "")), "@x_user");
        assert_eq!(greeting_name(&request(Command::Id, None, "")), "користувач");
    }
}
