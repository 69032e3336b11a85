//! Numeric identifiers
//!
//! `MemberId` and `PaymentId` are store-assigned row ids. `ExternalId` is the
//! stable numeric identity the messaging platform assigns to a person, and
//! `GroupId` identifies a community's private group on that platform
//! (group ids are usually negative).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            #[inline]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            #[inline]
            pub const fn into_inner(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

id_type!(
    /// Member (enrollment row) identifier
    MemberId
);
id_type!(
    /// Payment attempt identifier
    PaymentId
);
id_type!(
    /// Messaging-platform identity of a person
    ExternalId
);
id_type!(
    /// Messaging-platform identifier of a community group
    GroupId
);

impl ExternalId {
    /// Parse a user-supplied identity. Only a plain run of ASCII digits
    /// denoting a positive number is accepted.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DomainError::InvalidExternalId(raw.to_string()));
        }

        match trimmed.parse::<i64>() {
            Ok(id) if id > 0 => Ok(Self(id)),
            _ => Err(DomainError::InvalidExternalId(raw.to_string())),
        }
    }
}

impl std::str::FromStr for GroupId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Self)
    }
}
