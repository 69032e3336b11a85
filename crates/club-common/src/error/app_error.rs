//! Application error types
//!
//! Infrastructure-level failures shared by both binaries: startup, store
//! connectivity, the messaging platform, plus service errors lifted to the
//! process boundary.

use club_core::DomainError;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Startup wiring failed (missing dependency, bad rate limit, ...)
    #[error("Setup error: {0}")]
    Setup(String),

    #[error("Database error: {0}")]
    Database(String),

    /// Messaging platform unreachable or refusing the bot
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Listener bind or serve loop failure
    #[error("Server error: {0}")]
    Server(#[source] std::io::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),
}

impl AppError {
    /// HTTP status equivalent, used when the error reaches the API
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::ExternalService(_) => 502,
            Self::Domain(e) if e.is_not_found() => 404,
            Self::Domain(e) if e.is_validation() => 400,
            Self::Domain(e) if e.is_conflict() => 409,
            Self::Domain(_)
            | Self::Config(_)
            | Self::Setup(_)
            | Self::Database(_)
            | Self::Server(_)
            | Self::Internal(_) => 500,
        }
    }

    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::Setup(_) => "SETUP_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
            Self::Server(_) => "SERVER_ERROR",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Domain(e) => e.code(),
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }

    pub fn database(err: impl std::fmt::Display) -> Self {
        Self::Database(err.to_string())
    }

    pub fn setup(err: impl std::fmt::Display) -> Self {
        Self::Setup(err.to_string())
    }
}
