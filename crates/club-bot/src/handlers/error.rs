//! Handler error types

use club_core::DomainError;
use club_service::ServiceError;
use thiserror::Error;

/// Handler error type
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Service error
    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    /// Domain error (identity resolution)
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),
}

/// Handler result type
pub type HandlerResult<T> = Result<T, HandlerError>;
