//! Domain errors - error types for the domain layer

use thiserror::Error;

use crate::entities::Community;
use crate::value_objects::{MemberId, PaymentId};

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("Member not found: {0}")]
    MemberNotFound(MemberId),

    #[error("Payment not found: {0}")]
    PaymentNotFound(String),

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid handle: {0}")]
    InvalidHandle(String),

    #[error("Invalid external identity: {0}")]
    InvalidExternalId(String),

    #[error("Unknown community: {0}")]
    UnknownCommunity(String),

    #[error("Either a handle or an external identity is required")]
    MissingIdentity,

    // =========================================================================
    // Conflict Errors
    // =========================================================================
    #[error("Already has an active subscription to {0}")]
    ActiveSubscriptionExists(Community),

    #[error("Payment {0} is already settled")]
    PaymentAlreadySettled(PaymentId),

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Get an error code string for API responses
    pub fn code(&self) -> &'static str {
        match self {
            // Not Found
            Self::MemberNotFound(_) => "UNKNOWN_MEMBER",
            Self::PaymentNotFound(_) => "UNKNOWN_PAYMENT",

            // Validation
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::InvalidHandle(_) => "INVALID_HANDLE",
            Self::InvalidExternalId(_) => "INVALID_EXTERNAL_ID",
            Self::UnknownCommunity(_) => "UNKNOWN_COMMUNITY",
            Self::MissingIdentity => "MISSING_IDENTITY",

            // Conflict
            Self::ActiveSubscriptionExists(_) => "ACTIVE_SUBSCRIPTION_EXISTS",
            Self::PaymentAlreadySettled(_) => "PAYMENT_ALREADY_SETTLED",

            // Infrastructure
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::MemberNotFound(_) | Self::PaymentNotFound(_))
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ValidationError(_)
                | Self::InvalidHandle(_)
                | Self::InvalidExternalId(_)
                | Self::UnknownCommunity(_)
                | Self::MissingIdentity
        )
    }

    /// Check if this is a conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::ActiveSubscriptionExists(_) | Self::PaymentAlreadySettled(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = DomainError::MemberNotFound(MemberId::new(1));
        assert_eq!(err.code(), "UNKNOWN_MEMBER");

        let err = DomainError::ActiveSubscriptionExists(Community::Food);
        assert_eq!(err.code(), "ACTIVE_SUBSCRIPTION_EXISTS");
    }

    #[test]
    fn test_classification() {
        assert!(DomainError::MemberNotFound(MemberId::new(1)).is_not_found());
        assert!(DomainError::MissingIdentity.is_validation());
        assert!(DomainError::PaymentAlreadySettled(PaymentId::new(3)).is_conflict());
        assert!(!DomainError::DatabaseError("x".to_string()).is_conflict());
    }

    #[test]
    fn test_error_display() {
        let err = DomainError::MemberNotFound(MemberId::new(123));
        assert_eq!(err.to_string(), "Member not found: 123");

        let err = DomainError::ActiveSubscriptionExists(Community::Nikotin);
        assert_eq!(err.to_string(), "Already has an active subscription to nikotin");
    }
}
