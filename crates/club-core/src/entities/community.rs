//! Community - the fixed catalog of paid groups

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the paid membership groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Community {
    Nikotin,
    Food,
    Social,
}

impl Community {
    /// Every community, in catalog order
    pub const ALL: [Community; 3] = [Self::Nikotin, Self::Food, Self::Social];

    /// Stable identifier, also used as the stored value
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Nikotin => "nikotin",
            Self::Food => "food",
            Self::Social => "social",
        }
    }

    /// Upper-case form used in configuration variable names
    pub const fn env_key(self) -> &'static str {
        match self {
            Self::Nikotin => "NIKOTIN",
            Self::Food => "FOOD",
            Self::Social => "SOCIAL",
        }
    }
}

impl fmt::Display for Community {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when parsing an unknown community identifier
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown community: {0}")]
pub struct CommunityParseError(pub String);

impl FromStr for Community {
    type Err = CommunityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nikotin" => Ok(Self::Nikotin),
            "food" => Ok(Self::Food),
            "social" => Ok(Self::Social),
            _ => Err(CommunityParseError(s.to_string())),
        }
    }
}
