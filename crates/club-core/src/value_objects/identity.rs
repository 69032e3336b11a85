//! Identity resolution
//!
//! A person is known by a mutable, case-insensitive handle and, once they have
//! interacted with the bot or completed activation, by a stable external id.
//! Every lookup "by identity" goes through [`IdentityKey`] so the rule
//! "same external id OR same handle" lives in one place.

use std::fmt;

use super::{ExternalId, Handle};
use crate::error::DomainError;

/// Canonical identity used for store lookups and deduplication
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    handle: Option<Handle>,
    external_id: Option<ExternalId>,
}

impl IdentityKey {
    /// Resolve raw identity fields into a key.
    ///
    /// A handle that fails validation is ignored when an external id is
    /// present (platform users may have no usable username); without an
    /// external id it is an error. At least one of the two must remain.
    pub fn resolve(handle: Option<&str>, external_id: Option<i64>) -> Result<Self, DomainError> {
        let external_id = match external_id {
            Some(id) if id > 0 => Some(ExternalId::new(id)),
            Some(id) => return Err(DomainError::InvalidExternalId(id.to_string())),
            None => None,
        };

        let handle = match handle.map(str::trim).filter(|h| !h.is_empty()) {
            Some(raw) => match Handle::parse(raw) {
                Ok(handle) => Some(handle),
                Err(_) if external_id.is_some() => None,
                Err(e) => return Err(e),
            },
            None => None,
        };

        Self::from_parts(handle, external_id)
    }

    /// Build a key from already validated parts
    pub fn from_parts(
        handle: Option<Handle>,
        external_id: Option<ExternalId>,
    ) -> Result<Self, DomainError> {
        if handle.is_none() && external_id.is_none() {
            return Err(DomainError::MissingIdentity);
        }
        Ok(Self {
            handle,
            external_id,
        })
    }

    /// Key for a row that always carries a handle
    pub fn with_handle(handle: Handle, external_id: Option<ExternalId>) -> Self {
        Self {
            handle: Some(handle),
            external_id,
        }
    }

    pub fn handle(&self) -> Option<&Handle> {
        self.handle.as_ref()
    }

    pub fn external_id(&self) -> Option<ExternalId> {
        self.external_id
    }

    /// Stable string form: the external id when known, the handle otherwise
    pub fn canonical(&self) -> String {
        match (&self.external_id, &self.handle) {
            (Some(id), _) => format!("ext:{id}"),
            (None, Some(handle)) => format!("handle:{handle}"),
            (None, None) => String::new(),
        }
    }

    /// Whether a stored row with these identity fields belongs to this person
    pub fn matches(&self, handle: &Handle, external_id: Option<ExternalId>) -> bool {
        let by_external = matches!((self.external_id, external_id), (Some(a), Some(b)) if a == b);
        let by_handle = self.handle.as_ref() == Some(handle);
        by_external || by_handle
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}
