//! Membership arbitration
//!
//! Join requests and arrivals in a community group are checked against the
//! store: only identities holding an active subscription may stay. This
//! catches shared invite links and stale approvals.

use futures_util::{Stream, StreamExt};
use tracing::{debug, info, instrument, warn};

use club_core::{Community, ExternalId, GroupId, Handle, IdentityKey, MembershipEvent};

use super::context::ServiceContext;
use super::error::ServiceResult;

/// What the arbiter did with one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArbitrationDecision {
    /// Join request approved
    Approved,
    /// Join request declined
    Declined,
    /// Arrival of a subscriber, nothing to do
    Allowed,
    /// Arrival without a subscription, user removed
    Removed,
    /// Unknown group, departure, privileged user or bot
    Ignored,
}

/// Membership arbiter
pub struct MembershipArbiter<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> MembershipArbiter<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Consume an event stream until it ends. Failures are logged per event.
    pub async fn run<S>(&self, events: S)
    where
        S: Stream<Item = MembershipEvent> + Send,
    {
        let mut events = std::pin::pin!(events);
        while let Some(event) = events.next().await {
            if let Err(e) = self.handle_event(&event).await {
                warn!(group = %event.group(), user = %event.user(), error = %e, "Membership event not handled");
            }
        }
        info!("Membership event stream closed");
    }

    /// Decide and enforce one event
    #[instrument(skip(self, event), fields(group = %event.group(), user = %event.user()))]
    pub async fn handle_event(&self, event: &MembershipEvent) -> ServiceResult<ArbitrationDecision> {
        let Some(community) = self.ctx.registry().community_for_group(event.group()) else {
            debug!("Event for an unmanaged group");
            return Ok(ArbitrationDecision::Ignored);
        };

        let decision = match event {
            MembershipEvent::JoinRequest { group, user, handle } => {
                self.arbitrate_join_request(community, *group, *user, handle.as_deref())
                    .await?
            }
            MembershipEvent::StatusChanged { new, .. } if new.is_privileged() => {
                ArbitrationDecision::Ignored
            }
            MembershipEvent::StatusChanged { group, user, handle, .. } if event.is_arrival() => {
                self.arbitrate_arrival(community, *group, *user, handle.as_deref())
                    .await?
            }
            MembershipEvent::StatusChanged { .. } => ArbitrationDecision::Ignored,
        };

        if decision != ArbitrationDecision::Ignored {
            info!(community = %community, decision = ?decision, "Membership arbitrated");
        }
        Ok(decision)
    }

    async fn arbitrate_join_request(
        &self,
        community: Community,
        group: GroupId,
        user: ExternalId,
        handle: Option<&str>,
    ) -> ServiceResult<ArbitrationDecision> {
        let messenger = self.ctx.messenger();

        let result = if self.is_subscriber(community, user, handle).await? {
            self.ctx
                .call_messenger(messenger.approve_join_request(group, user))
                .await
                .map(|()| ArbitrationDecision::Approved)
        } else {
            self.ctx
                .call_messenger(messenger.decline_join_request(group, user))
                .await
                .map(|()| ArbitrationDecision::Declined)
        };

        match result {
            Ok(decision) => Ok(decision),
            // The request was withdrawn or already handled
            Err(e) if e.is_absent() => Ok(ArbitrationDecision::Ignored),
            Err(e) => Err(e.into()),
        }
    }

    async fn arbitrate_arrival(
        &self,
        community: Community,
        group: GroupId,
        user: ExternalId,
        handle: Option<&str>,
    ) -> ServiceResult<ArbitrationDecision> {
        if self.is_subscriber(community, user, handle).await? {
            return Ok(ArbitrationDecision::Allowed);
        }

        match self
            .ctx
            .call_messenger(self.ctx.messenger().remove_member(group, user))
            .await
        {
            Ok(()) => Ok(ArbitrationDecision::Removed),
            Err(e) if e.is_absent() => Ok(ArbitrationDecision::Removed),
            Err(e) => Err(e.into()),
        }
    }

    /// Whether the user holds an active subscription in `community`.
    /// A usable handle also links the external id to rows registered
    /// under that handle.
    async fn is_subscriber(
        &self,
        community: Community,
        user: ExternalId,
        handle: Option<&str>,
    ) -> ServiceResult<bool> {
        let handle = handle.and_then(|raw| Handle::parse(raw).ok());

        if let Some(handle) = &handle {
            let linked = self.ctx.member_repo().link_external_id(handle, user).await?;
            if linked > 0 {
                debug!(linked, "External id linked to registered rows");
            }
        }

        let identity = IdentityKey::from_parts(handle, Some(user))?;
        let active = self
            .ctx
            .member_repo()
            .find_active_subscription(community, &identity, self.ctx.now())
            .await?;
        Ok(active.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{group_of, TestHarness};
    use club_core::{MemberStatus, MessengerError};

    fn join(community: Community, user: i64, handle: Option<&str>) -> MembershipEvent {
        MembershipEvent::JoinRequest {
            group: group_of(community),
            user: ExternalId::new(user),
            handle: handle.map(str::to_string),
        }
    }

    fn arrival(community: Community, user: i64) -> MembershipEvent {
        MembershipEvent::StatusChanged {
            group: group_of(community),
            user: ExternalId::new(user),
            handle: None,
            old: MemberStatus::Left,
            new: MemberStatus::Member,
        }
    }

    #[tokio::test]
    async fn test_join_request_approved_for_subscriber() {
        let h = TestHarness::new();
        h.active_member("olena_k", Some(501), Community::Food).await;

        let decision = MembershipArbiter::new(&h.ctx)
            .handle_event(&join(Community::Food, 501, None))
            .await
            .unwrap();
        assert_eq!(decision, ArbitrationDecision::Approved);
    }

    #[tokio::test]
    async fn test_join_request_declined_without_subscription() {
        let h = TestHarness::new();
        h.active_member("olena_k", Some(501), Community::Food).await;

        let arbiter = MembershipArbiter::new(&h.ctx);
        // Subscribed to food, not social
        let decision = arbiter
            .handle_event(&join(Community::Social, 501, None))
            .await
            .unwrap();
        assert_eq!(decision, ArbitrationDecision::Declined);

        // Lapsed subscription
        h.clock.advance_secs(121);
        let decision = arbiter
            .handle_event(&join(Community::Food, 501, None))
            .await
            .unwrap();
        assert_eq!(decision, ArbitrationDecision::Declined);
    }

    #[tokio::test]
    async fn test_join_request_links_handle() {
        let h = TestHarness::new();
        let member = h.active_member("olena_k", None, Community::Food).await;

        let decision = MembershipArbiter::new(&h.ctx)
            .handle_event(&join(Community::Food, 777, Some("Olena_K")))
            .await
            .unwrap();
        assert_eq!(decision, ArbitrationDecision::Approved);
        assert_eq!(h.member(member.id).external_id, Some(ExternalId::new(777)));
    }

    #[tokio::test]
    async fn test_arrival_without_subscription_removed() {
        let h = TestHarness::new();
        let arbiter = MembershipArbiter::new(&h.ctx);

        let decision = arbiter.handle_event(&arrival(Community::Food, 900)).await.unwrap();
        assert_eq!(decision, ArbitrationDecision::Removed);
        assert_eq!(h.messenger.removals(), vec![(Community::Food, 900)]);

        h.active_member("olena_k", Some(501), Community::Food).await;
        let decision = arbiter.handle_event(&arrival(Community::Food, 501)).await.unwrap();
        assert_eq!(decision, ArbitrationDecision::Allowed);
    }

    #[tokio::test]
    async fn test_ignored_events() {
        let h = TestHarness::new();
        let arbiter = MembershipArbiter::new(&h.ctx);

        let unknown_group = MembershipEvent::JoinRequest {
            group: GroupId::new(-1),
            user: ExternalId::new(5),
            handle: None,
        };
        assert_eq!(
            arbiter.handle_event(&unknown_group).await.unwrap(),
            ArbitrationDecision::Ignored
        );

        let departure = MembershipEvent::StatusChanged {
            group: group_of(Community::Food),
            user: ExternalId::new(5),
            handle: None,
            old: MemberStatus::Member,
            new: MemberStatus::Left,
        };
        assert_eq!(
            arbiter.handle_event(&departure).await.unwrap(),
            ArbitrationDecision::Ignored
        );

        let promoted_admin = MembershipEvent::StatusChanged {
            group: group_of(Community::Food),
            user: ExternalId::new(5),
            handle: None,
            old: MemberStatus::Left,
            new: MemberStatus::Administrator,
        };
        assert_eq!(
            arbiter.handle_event(&promoted_admin).await.unwrap(),
            ArbitrationDecision::Ignored
        );
        assert!(h.messenger.removals().is_empty());
    }

    #[tokio::test]
    async fn test_removal_failure_propagates() {
        let h = TestHarness::new();
        h.messenger.fail_removals(MessengerError::Timeout);
        let result = MembershipArbiter::new(&h.ctx)
            .handle_event(&arrival(Community::Food, 900))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_run_consumes_stream() {
        let h = TestHarness::new();
        h.active_member("olena_k", Some(501), Community::Food).await;
        let events = futures_util::stream::iter(vec![
            arrival(Community::Food, 900),
            join(Community::Food, 501, None),
        ]);

        MembershipArbiter::new(&h.ctx).run(events).await;
        assert_eq!(h.messenger.removals(), vec![(Community::Food, 900)]);
        assert_eq!(h.messenger.approvals(), vec![(Community::Food, 501)]);
    }
}
