//! Community registry
//!
//! Immutable lookup table built once at startup from configuration. No I/O.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::entities::Community;
use crate::time::RenewalDuration;
use crate::value_objects::GroupId;

/// Static definition of one community
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommunityDefinition {
    pub community: Community,
    pub display_name: String,
    /// Whole currency units
    pub price: i64,
    /// Community-specific renewal length; the registry fallback applies when unset
    pub duration: Option<RenewalDuration>,
    pub group_id: GroupId,
}

impl CommunityDefinition {
    pub fn new(
        community: Community,
        display_name: impl Into<String>,
        price: i64,
        group_id: GroupId,
    ) -> Self {
        Self {
            community,
            display_name: display_name.into(),
            price,
            duration: None,
            group_id,
        }
    }

    /// Set the duration from raw seconds; non-positive values leave it unset
    pub fn with_duration_secs(mut self, secs: Option<i64>) -> Self {
        self.duration = secs.and_then(RenewalDuration::from_secs);
        self
    }
}

/// Lookup table of all communities
#[derive(Debug, Clone)]
pub struct CommunityRegistry {
    definitions: BTreeMap<Community, CommunityDefinition>,
    fallback_duration: RenewalDuration,
}

impl CommunityRegistry {
    pub fn new(
        fallback_duration: RenewalDuration,
        definitions: impl IntoIterator<Item = CommunityDefinition>,
    ) -> Self {
        Self {
            definitions: definitions
                .into_iter()
                .map(|def| (def.community, def))
                .collect(),
            fallback_duration,
        }
    }

    pub fn get(&self, community: Community) -> Option<&CommunityDefinition> {
        self.definitions.get(&community)
    }

    /// Renewal length for a community, falling back to the global default
    pub fn duration_for(&self, community: Community) -> RenewalDuration {
        self.get(community)
            .and_then(|def| def.duration)
            .unwrap_or(self.fallback_duration)
    }

    pub fn fallback_duration(&self) -> RenewalDuration {
        self.fallback_duration
    }

    pub fn group_for(&self, community: Community) -> Option<GroupId> {
        self.get(community).map(|def| def.group_id)
    }

    /// Reverse lookup used for inbound membership events
    pub fn community_for_group(&self, group_id: GroupId) -> Option<Community> {
        self.definitions
            .values()
            .find(|def| def.group_id == group_id)
            .map(|def| def.community)
    }

    /// Definitions in catalog order
    pub fn all(&self) -> impl Iterator<Item = &CommunityDefinition> {
        self.definitions.values()
    }
}
