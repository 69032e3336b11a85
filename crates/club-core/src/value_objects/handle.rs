//! Handle - the case-insensitive public username of a person on the
//! messaging platform

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

/// Normalized handle: no leading `@`, lower-case, 5-32 of `[a-z0-9_]`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Handle(String);

impl Handle {
    pub const MIN_LEN: usize = 5;
    pub const MAX_LEN: usize = 32;

    /// Normalize and validate a raw handle
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let normalized = raw.trim().trim_start_matches('@').to_ascii_lowercase();

        let len = normalized.len();
        if !(Self::MIN_LEN..=Self::MAX_LEN).contains(&len) {
            return Err(DomainError::InvalidHandle(format!(
                "must be {}-{} characters",
                Self::MIN_LEN,
                Self::MAX_LEN
            )));
        }

        if !normalized
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
        {
            return Err(DomainError::InvalidHandle(
                "only letters, digits and underscores are allowed".to_string(),
            ));
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Handle {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Handle> for String {
    fn from(handle: Handle) -> Self {
        handle.0
    }
}

impl AsRef<str> for Handle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
