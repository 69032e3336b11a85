//! In-memory store, recording messenger and fixtures for service tests

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::Mutex;

use club_core::traits::{
    Activation, GroupMessenger, MemberRepository, PaymentRepository, Registration, RepoResult,
    SubscriptionSummary,
};
use club_core::{
    Community, CommunityDefinition, CommunityRegistry, DomainError, ExternalId, GroupId, Handle,
    IdentityKey, ManualClock, Member, MemberId, MemberStatus, MessengerError, MessengerResult,
    NewMember, Payment, PaymentId, PaymentStatus, RenewalDuration,
};

use crate::services::{ServiceContext, ServiceContextBuilder, SubscriptionService, SubscriptionSettings};

pub(crate) fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 10, 12, 0, 0).unwrap()
}

pub(crate) fn group_of(community: Community) -> GroupId {
    match community {
        Community::Nikotin => GroupId::new(-1001),
        Community::Food => GroupId::new(-1002),
        Community::Social => GroupId::new(-1003),
    }
}

fn community_of(group: GroupId) -> Community {
    Community::ALL
        .into_iter()
        .find(|c| group_of(*c) == group)
        .unwrap()
}

// ============================================================================
// In-memory store
// ============================================================================

#[derive(Default)]
struct StoreState {
    members: BTreeMap<MemberId, Member>,
    payments: BTreeMap<PaymentId, Payment>,
    next_id: i64,
}

impl StoreState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn has_completed(&self, member_id: MemberId) -> bool {
        self.payments
            .values()
            .any(|p| p.member_id == member_id && p.status == PaymentStatus::Completed)
    }

    fn latest_payment(&self, member_id: MemberId) -> Option<&Payment> {
        self.payments
            .values()
            .filter(|p| p.member_id == member_id)
            .max_by_key(|p| p.id)
    }

    fn matching<'a>(
        &'a self,
        community: Community,
        identity: &'a IdentityKey,
    ) -> impl Iterator<Item = &'a Member> + 'a {
        self.members
            .values()
            .filter(move |m| m.community == community && identity.matches(&m.handle, m.external_id))
    }
}

/// Store honouring the same contracts as the PostgreSQL repositories,
/// including the active-row uniqueness rule
pub(crate) struct InMemoryStore {
    state: Mutex<StoreState>,
    clock: Arc<ManualClock>,
}

impl InMemoryStore {
    fn new(clock: Arc<ManualClock>) -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            clock,
        }
    }

    fn now(&self) -> DateTime<Utc> {
        use club_core::Clock;
        self.clock.now()
    }
}

#[async_trait]
impl MemberRepository for InMemoryStore {
    async fn find_by_id(&self, id: MemberId) -> RepoResult<Option<Member>> {
        Ok(self.state.lock().members.get(&id).cloned())
    }

    async fn find_active_subscription(
        &self,
        community: Community,
        identity: &IdentityKey,
        now: DateTime<Utc>,
    ) -> RepoResult<Option<Member>> {
        let state = self.state.lock();
        Ok(state
            .matching(community, identity)
            .filter(|m| m.is_active_at(now) && state.has_completed(m.id))
            .max_by_key(|m| m.expires_at)
            .cloned())
    }

    async fn find_latest_per_community(
        &self,
        identity: &IdentityKey,
    ) -> RepoResult<Vec<SubscriptionSummary>> {
        let state = self.state.lock();
        let mut summaries = Vec::new();
        for community in Community::ALL {
            let latest = state
                .matching(community, identity)
                .max_by_key(|m| (m.expires_at.is_some(), m.expires_at, m.id));
            if let Some(member) = latest {
                summaries.push(SubscriptionSummary {
                    member: member.clone(),
                    latest_payment: state.latest_payment(member.id).map(|p| p.status),
                });
            }
        }
        Ok(summaries)
    }

    async fn find_expired_active(&self, now: DateTime<Utc>) -> RepoResult<Vec<Member>> {
        let state = self.state.lock();
        let mut latest: HashMap<(Community, String), Member> = HashMap::new();
        for member in state.members.values() {
            let expired = member.active && member.expires_at.is_some_and(|e| e <= now);
            if !expired || !state.has_completed(member.id) {
                continue;
            }
            let key = (member.community, member.identity().canonical());
            let keep = latest
                .get(&key)
                .map_or(true, |current| member.expires_at > current.expires_at);
            if keep {
                latest.insert(key, member.clone());
            }
        }
        let mut rows: Vec<Member> = latest.into_values().collect();
        rows.sort_by_key(|m| (m.expires_at, m.id));
        Ok(rows)
    }

    async fn find_soon_expiring(
        &self,
        now: DateTime<Utc>,
        window: Duration,
    ) -> RepoResult<Vec<Member>> {
        let state = self.state.lock();
        let mut rows: Vec<Member> = state
            .members
            .values()
            .filter(|m| {
                m.active
                    && !m.expiry_warning_sent
                    && m.expires_at.is_some_and(|e| e > now && e <= now + window)
                    && state.has_completed(m.id)
            })
            .cloned()
            .collect();
        rows.sort_by_key(|m| (m.expires_at, m.id));
        Ok(rows)
    }

    async fn find_pending_removals(&self) -> RepoResult<Vec<Member>> {
        let state = self.state.lock();
        let mut rows: Vec<Member> = state
            .members
            .values()
            .filter(|m| m.removal_pending && !m.active)
            .filter(|m| {
                let identity = m.identity();
                let renewed = state
                    .matching(m.community, &identity)
                    .any(|other| other.id != m.id && other.active);
                !renewed
            })
            .cloned()
            .collect();
        rows.sort_by_key(|m| (m.expires_at, m.id));
        Ok(rows)
    }

    async fn list_active(&self) -> RepoResult<Vec<Member>> {
        let state = self.state.lock();
        let mut rows: Vec<Member> = state.members.values().filter(|m| m.active).cloned().collect();
        rows.sort_by_key(|m| (m.expires_at, m.id));
        Ok(rows)
    }

    async fn register(
        &self,
        member: &NewMember,
        amount: i64,
        order_ref: &str,
    ) -> RepoResult<Registration> {
        let now = self.now();
        let mut state = self.state.lock();
        if state.payments.values().any(|p| p.order_ref == order_ref) {
            return Err(DomainError::ValidationError("duplicate order reference".to_string()));
        }

        let member_id = MemberId::new(state.next_id());
        let row = Member {
            id: member_id,
            handle: member.handle.clone(),
            external_id: member.external_id,
            phone: member.phone.clone(),
            community: member.community,
            joined_at: now,
            expires_at: None,
            active: false,
            invite_link: None,
            expiry_warning_sent: false,
            removal_pending: false,
            created_at: now,
            updated_at: now,
        };
        let payment = Payment {
            id: PaymentId::new(state.next_id()),
            member_id,
            amount,
            status: PaymentStatus::Pending,
            order_ref: order_ref.to_string(),
            created_at: now,
            updated_at: now,
        };
        state.members.insert(member_id, row.clone());
        state.payments.insert(payment.id, payment.clone());

        Ok(Registration {
            member: row,
            payment,
        })
    }

    async fn deactivate(&self, id: MemberId, now: DateTime<Utc>) -> RepoResult<bool> {
        let mut state = self.state.lock();
        let Some(member) = state.members.get_mut(&id) else {
            return Ok(false);
        };
        if !member.active || !member.expires_at.is_some_and(|e| e <= now) {
            return Ok(false);
        }
        member.active = false;
        member.invite_link = None;
        member.expiry_warning_sent = false;
        member.removal_pending = member.external_id.is_some();
        member.updated_at = now;
        Ok(true)
    }

    async fn mark_warned(&self, id: MemberId) -> RepoResult<()> {
        let mut state = self.state.lock();
        let member = state
            .members
            .get_mut(&id)
            .ok_or(DomainError::MemberNotFound(id))?;
        member.expiry_warning_sent = true;
        Ok(())
    }

    async fn apply_activation(&self, activation: &Activation) -> RepoResult<Member> {
        let mut state = self.state.lock();
        let now = activation.now;

        if let Some(payment_id) = activation.settle_payment {
            let pending = state.payments.get(&payment_id).is_some_and(Payment::is_pending);
            if !pending {
                return Err(DomainError::PaymentAlreadySettled(payment_id));
            }
        }

        let member = state
            .members
            .get(&activation.member_id)
            .cloned()
            .ok_or(DomainError::MemberNotFound(activation.member_id))?;
        let external_id = activation.external_id.or(member.external_id);
        let identity = IdentityKey::with_handle(member.handle.clone(), external_id);

        let related: Vec<Member> = state
            .matching(member.community, &identity)
            .filter(|m| m.id != member.id)
            .cloned()
            .collect();
        if related.iter().any(|m| m.is_active_at(now)) {
            return Err(DomainError::ActiveSubscriptionExists(member.community));
        }

        for other in related {
            if let Some(row) = state.members.get_mut(&other.id) {
                if row.active {
                    row.active = false;
                    row.invite_link = None;
                }
                row.removal_pending = false;
            }
        }

        let row = state
            .members
            .get_mut(&activation.member_id)
            .ok_or(DomainError::MemberNotFound(activation.member_id))?;
        row.active = true;
        row.expires_at = Some(row.expires_at.map_or(activation.expires_at, |current| {
            current.max(activation.expires_at)
        }));
        if activation.invite_link.is_some() {
            row.invite_link.clone_from(&activation.invite_link);
        }
        row.external_id = external_id;
        row.expiry_warning_sent = false;
        row.removal_pending = false;
        row.updated_at = now;
        let activated = row.clone();

        if let Some(payment_id) = activation.settle_payment {
            if let Some(payment) = state.payments.get_mut(&payment_id) {
                payment.status = PaymentStatus::Completed;
                payment.updated_at = now;
            }
        }

        Ok(activated)
    }

    async fn set_invite_link(&self, id: MemberId, invite_link: &str) -> RepoResult<()> {
        let mut state = self.state.lock();
        let member = state
            .members
            .get_mut(&id)
            .ok_or(DomainError::MemberNotFound(id))?;
        member.invite_link = Some(invite_link.to_string());
        Ok(())
    }

    async fn clear_pending_removal(&self, id: MemberId) -> RepoResult<()> {
        let mut state = self.state.lock();
        let member = state
            .members
            .get_mut(&id)
            .ok_or(DomainError::MemberNotFound(id))?;
        member.removal_pending = false;
        Ok(())
    }

    async fn link_external_id(&self, handle: &Handle, external_id: ExternalId) -> RepoResult<u64> {
        let mut state = self.state.lock();
        let taken: Vec<Community> = state
            .members
            .values()
            .filter(|m| m.active && m.external_id == Some(external_id))
            .map(|m| m.community)
            .collect();

        let mut updated = 0;
        for member in state.members.values_mut() {
            if member.handle != *handle || member.external_id.is_some() {
                continue;
            }
            if member.active && taken.contains(&member.community) {
                continue;
            }
            member.external_id = Some(external_id);
            updated += 1;
        }
        Ok(updated)
    }
}

#[async_trait]
impl PaymentRepository for InMemoryStore {
    async fn find_by_order_ref(&self, order_ref: &str) -> RepoResult<Option<Payment>> {
        Ok(self
            .state
            .lock()
            .payments
            .values()
            .find(|p| p.order_ref == order_ref)
            .cloned())
    }

    async fn create_for_member(
        &self,
        member_id: MemberId,
        amount: i64,
        order_ref: &str,
    ) -> RepoResult<Payment> {
        let now = self.now();
        let mut state = self.state.lock();
        if !state.members.contains_key(&member_id) {
            return Err(DomainError::MemberNotFound(member_id));
        }
        let payment = Payment {
            id: PaymentId::new(state.next_id()),
            member_id,
            amount,
            status: PaymentStatus::Pending,
            order_ref: order_ref.to_string(),
            created_at: now,
            updated_at: now,
        };
        state.payments.insert(payment.id, payment.clone());
        Ok(payment)
    }

    async fn mark_failed(&self, id: PaymentId) -> RepoResult<bool> {
        let mut state = self.state.lock();
        match state.payments.get_mut(&id) {
            Some(payment) if payment.is_pending() => {
                payment.status = PaymentStatus::Failed;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn latest_for_member(&self, member_id: MemberId) -> RepoResult<Option<Payment>> {
        Ok(self.state.lock().latest_payment(member_id).cloned())
    }
}

// ============================================================================
// Recording messenger
// ============================================================================

#[derive(Default)]
struct MessengerState {
    statuses: HashMap<(GroupId, ExternalId), MemberStatus>,
    invites: Vec<(GroupId, DateTime<Utc>)>,
    revoked: Vec<String>,
    removals: Vec<(GroupId, ExternalId)>,
    lifted_bans: Vec<(GroupId, ExternalId)>,
    approvals: Vec<(GroupId, ExternalId)>,
    declines: Vec<(GroupId, ExternalId)>,
    notices: Vec<(ExternalId, String)>,
    fail_invites: Option<MessengerError>,
    fail_removals: Option<MessengerError>,
    fail_notices: Option<MessengerError>,
}

/// Messenger that records every call; users are group members unless told otherwise
#[derive(Default)]
pub(crate) struct RecordingMessenger {
    state: Mutex<MessengerState>,
}

impl RecordingMessenger {
    pub(crate) fn set_status(&self, community: Community, user: i64, status: MemberStatus) {
        self.state
            .lock()
            .statuses
            .insert((group_of(community), ExternalId::new(user)), status);
    }

    pub(crate) fn fail_invites(&self, err: MessengerError) {
        self.state.lock().fail_invites = Some(err);
    }

    pub(crate) fn fail_removals(&self, err: MessengerError) {
        self.state.lock().fail_removals = Some(err);
    }

    pub(crate) fn fail_notices(&self, err: MessengerError) {
        self.state.lock().fail_notices = Some(err);
    }

    pub(crate) fn clear_failures(&self) {
        let mut state = self.state.lock();
        state.fail_invites = None;
        state.fail_removals = None;
        state.fail_notices = None;
    }

    pub(crate) fn invites_created(&self) -> usize {
        self.state.lock().invites.len()
    }

    pub(crate) fn last_invite(&self) -> Option<(GroupId, DateTime<Utc>)> {
        self.state.lock().invites.last().copied()
    }

    pub(crate) fn revoked_invites(&self) -> Vec<String> {
        self.state.lock().revoked.clone()
    }

    pub(crate) fn removals(&self) -> Vec<(Community, i64)> {
        self.state
            .lock()
            .removals
            .iter()
            .map(|(group, user)| (community_of(*group), user.into_inner()))
            .collect()
    }

    pub(crate) fn lifted_bans(&self) -> Vec<(Community, i64)> {
        self.state
            .lock()
            .lifted_bans
            .iter()
            .map(|(group, user)| (community_of(*group), user.into_inner()))
            .collect()
    }

    pub(crate) fn approvals(&self) -> Vec<(Community, i64)> {
        self.state
            .lock()
            .approvals
            .iter()
            .map(|(group, user)| (community_of(*group), user.into_inner()))
            .collect()
    }

    pub(crate) fn notices_to(&self, user: i64) -> usize {
        self.state
            .lock()
            .notices
            .iter()
            .filter(|(to, _)| to.into_inner() == user)
            .count()
    }
}

#[async_trait]
impl GroupMessenger for RecordingMessenger {
    async fn create_invite(
        &self,
        group: GroupId,
        expires_at: DateTime<Utc>,
        _name: &str,
    ) -> MessengerResult<String> {
        let mut state = self.state.lock();
        if let Some(err) = state.fail_invites.clone() {
            return Err(err);
        }
        state.invites.push((group, expires_at));
        Ok(format!("https://t.me/+invite{}", state.invites.len()))
    }

    async fn revoke_invite(&self, _group: GroupId, invite_link: &str) -> MessengerResult<()> {
        self.state.lock().revoked.push(invite_link.to_string());
        Ok(())
    }

    async fn member_status(&self, group: GroupId, user: ExternalId) -> MessengerResult<MemberStatus> {
        Ok(self
            .state
            .lock()
            .statuses
            .get(&(group, user))
            .copied()
            .unwrap_or(MemberStatus::Member))
    }

    async fn remove_member(&self, group: GroupId, user: ExternalId) -> MessengerResult<()> {
        let mut state = self.state.lock();
        if let Some(err) = state.fail_removals.clone() {
            return Err(err);
        }
        state.removals.push((group, user));
        state.statuses.insert((group, user), MemberStatus::Left);
        Ok(())
    }

    async fn lift_ban(&self, group: GroupId, user: ExternalId) -> MessengerResult<()> {
        let mut state = self.state.lock();
        if let Some(err) = state.fail_removals.clone() {
            return Err(err);
        }
        state.lifted_bans.push((group, user));
        state.statuses.insert((group, user), MemberStatus::Left);
        Ok(())
    }

    async fn approve_join_request(&self, group: GroupId, user: ExternalId) -> MessengerResult<()> {
        self.state.lock().approvals.push((group, user));
        Ok(())
    }

    async fn decline_join_request(&self, group: GroupId, user: ExternalId) -> MessengerResult<()> {
        self.state.lock().declines.push((group, user));
        Ok(())
    }

    async fn send_notice(&self, user: ExternalId, text: &str) -> MessengerResult<()> {
        let mut state = self.state.lock();
        if let Some(err) = state.fail_notices.clone() {
            return Err(err);
        }
        state.notices.push((user, text.to_string()));
        Ok(())
    }
}

// ============================================================================
// Harness
// ============================================================================

pub(crate) struct TestHarness {
    pub ctx: ServiceContext,
    pub clock: Arc<ManualClock>,
    pub messenger: Arc<RecordingMessenger>,
    store: Arc<InMemoryStore>,
}

impl TestHarness {
    /// Every community renews for 120 seconds; warnings go out an hour ahead
    pub(crate) fn new() -> Self {
        Self::with_durations(120)
    }

    pub(crate) fn with_durations(secs: i64) -> Self {
        let clock = Arc::new(ManualClock::new(t0()));
        let store = Arc::new(InMemoryStore::new(clock.clone()));
        let messenger = Arc::new(RecordingMessenger::default());

        let registry = CommunityRegistry::new(
            RenewalDuration::from_secs(30 * 24 * 3600).unwrap(),
            Community::ALL.into_iter().map(|community| {
                let price = if community == Community::Nikotin { 800 } else { 600 };
                CommunityDefinition::new(community, community.as_str(), price, group_of(community))
                    .with_duration_secs(Some(secs))
            }),
        );

        let ctx = ServiceContextBuilder::new()
            .member_repo(store.clone())
            .payment_repo(store.clone())
            .messenger(messenger.clone())
            .registry(registry)
            .clock(clock.clone())
            .settings(SubscriptionSettings {
                invite_ttl: Duration::days(1),
                warning_lead: Duration::hours(1),
                messenger_timeout: std::time::Duration::from_secs(5),
            })
            .build()
            .unwrap();

        Self {
            ctx,
            clock,
            messenger,
            store,
        }
    }

    pub(crate) async fn register(
        &self,
        handle: &str,
        external_id: Option<i64>,
        community: Community,
    ) -> Registration {
        let new_member = NewMember::new(Handle::parse(handle).unwrap(), "+380501234567", community)
            .with_external_id(external_id.map(ExternalId::new));
        let order_ref = format!("order_{}", uuid::Uuid::new_v4());
        self.store.register(&new_member, 600, &order_ref).await.unwrap()
    }

    pub(crate) async fn pending_member(
        &self,
        handle: &str,
        external_id: Option<i64>,
        community: Community,
    ) -> Member {
        self.register(handle, external_id, community).await.member
    }

    /// Registered and activated through a settled payment at the current instant
    pub(crate) async fn active_member(
        &self,
        handle: &str,
        external_id: Option<i64>,
        community: Community,
    ) -> Member {
        let registration = self.register(handle, external_id, community).await;
        SubscriptionService::new(&self.ctx)
            .activate_member(&registration.member, None, Some(registration.payment.id))
            .await
            .unwrap()
            .member
    }

    pub(crate) fn member(&self, id: MemberId) -> Member {
        self.store.state.lock().members.get(&id).cloned().unwrap()
    }

    pub(crate) fn payments_for(&self, id: MemberId) -> usize {
        self.store
            .state
            .lock()
            .payments
            .values()
            .filter(|p| p.member_id == id)
            .count()
    }
}
