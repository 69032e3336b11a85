//! Request DTOs for API endpoints
//!
//! All request DTOs implement `Deserialize` and `Validate` for input validation.
//! Shape checks live here; domain parsing (handle normalization, community
//! lookup) happens in the services.

use serde::Deserialize;
use validator::{Validate, ValidationError};

/// Registration form submission
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegistrationRequest {
    /// Platform username, with or without a leading `@`
    #[validate(length(min = 5, max = 33, message = "Handle must be 5-32 characters"))]
    pub handle: String,

    #[validate(custom(function = "validate_phone"))]
    pub phone: String,

    #[validate(length(min = 1, max = 32, message = "Community is required"))]
    pub community: String,

    /// Numeric platform identity as shown by the bot's `/id` command
    #[validate(length(min = 1, max = 20, message = "External id must be 1-20 digits"))]
    pub external_id: Option<String>,
}

/// Ukrainian mobile number: `+380` followed by nine digits
fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let valid = phone
        .strip_prefix("+380")
        .is_some_and(|rest| rest.len() == 9 && rest.bytes().all(|b| b.is_ascii_digit()));

    if valid {
        Ok(())
    } else {
        let mut err = ValidationError::new("phone");
        err.message = Some("Phone must look like +380XXXXXXXXX".into());
        Err(err)
    }
}

/// Outcome reported by the payment gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentOutcome {
    Success,
    Failure,
}

/// Payment gateway callback
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PaymentCallbackRequest {
    #[validate(length(min = 1, max = 128, message = "Order reference is required"))]
    pub order: String,

    pub status: PaymentOutcome,
}
