//! Path and query parameter extractors

use serde::Deserialize;

use club_core::{IdentityKey, MemberId};

use crate::response::ApiError;

/// `/members/{member}/...` segment.
///
/// Renewals address a numeric member row; status checks address a person
/// by handle. Both share the segment name so the routes do not conflict.
#[derive(Debug, Deserialize)]
pub struct MemberPath {
    pub member: String,
}

impl MemberPath {
    /// Parse the segment as a member row id
    pub fn member_id(&self) -> Result<MemberId, ApiError> {
        self.member
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|id| *id > 0)
            .map(MemberId::new)
            .ok_or_else(|| ApiError::invalid_path("Invalid member id format"))
    }
}

/// Optional numeric identity accompanying a status check
#[derive(Debug, Default, Deserialize)]
pub struct StatusQuery {
    pub external_id: Option<i64>,
}

impl StatusQuery {
    /// Identity for the path handle plus the optional external id
    pub fn identity(&self, path: &MemberPath) -> Result<IdentityKey, ApiError> {
        Ok(IdentityKey::resolve(Some(&path.member), self.external_id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(raw: &str) -> MemberPath {
        MemberPath {
            member: raw.to_string(),
        }
    }

    #[test]
    fn test_member_id_parsing() {
        assert_eq!(path("42").member_id().unwrap(), MemberId::new(42));
        assert!(path("0").member_id().is_err());
        assert!(path("-3").member_id().is_err());
        assert!(path("alice").member_id().is_err());
    }

    #[test]
    fn test_status_identity() {
        let query = StatusQuery::default();
        let identity = query.identity(&path("@Alice_01")).unwrap();
        assert_eq!(identity.handle().map(|h| h.as_str()), Some("alice_01"));

        // A malformed handle is tolerated when a numeric identity comes along
        let query = StatusQuery {
            external_id: Some(77),
        };
        let identity = query.identity(&path("a!")).unwrap();
        assert!(identity.handle().is_none());
        assert_eq!(identity.external_id().map(i64::from), Some(77));

        assert!(StatusQuery::default().identity(&path("a!")).is_err());
    }
}
