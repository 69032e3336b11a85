//! Bot API errors and their classification into messenger outcomes

use club_core::MessengerError;
use thiserror::Error;

/// Result type for Bot API calls
pub type TelegramResult<T> = Result<T, TelegramError>;

/// Descriptions (case-insensitive substrings) meaning "already absent"
const ABSENT_MARKERS: &[&str] = &[
    "not found",
    "user_not_participant",
    "participant_id_invalid",
    "hide_requester_missing",
    "user_already_participant",
];

/// Bot API call failures
#[derive(Debug, Error)]
pub enum TelegramError {
    /// Connection, TLS or timeout failure before a response arrived
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The API answered with `ok: false`
    #[error("api error {code}: {description}")]
    Api {
        code: u16,
        description: String,
        retry_after: Option<u64>,
    },

    /// The response body did not match the expected shape
    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("client setup failed: {0}")]
    Setup(String),
}

impl From<reqwest::Error> for TelegramError {
    fn from(err: reqwest::Error) -> Self {
        // Request URLs embed the bot token
        Self::Transport(err.without_url())
    }
}

impl TelegramError {
    /// The API reported that the user, member or join request does not exist
    pub fn is_absent(&self) -> bool {
        match self {
            Self::Api { code: 400, description, .. } => {
                let lower = description.to_lowercase();
                ABSENT_MARKERS.iter().any(|marker| lower.contains(marker))
            }
            _ => false,
        }
    }

    /// Worth retrying later (transport, throttling, server-side failures)
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Api { code, .. } => *code == 429 || *code >= 500,
            Self::Decode(_) | Self::Setup(_) => false,
        }
    }
}

impl From<TelegramError> for MessengerError {
    fn from(err: TelegramError) -> Self {
        let message = err.to_string();
        if err.is_absent() {
            Self::NotFound(message)
        } else if matches!(&err, TelegramError::Transport(e) if e.is_timeout()) {
            Self::Timeout
        } else if err.is_transient() {
            Self::Unavailable(message)
        } else if matches!(err, TelegramError::Api { .. }) {
            Self::Rejected(message)
        } else {
            Self::Unavailable(message)
        }
    }
}
