//! Service context - dependency container for services
//!
//! Holds the repositories, the messaging collaborator, the community registry
//! and the clock. Built once at startup and shared behind an `Arc`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use club_common::AppConfig;
use club_core::traits::{GroupMessenger, MemberRepository, PaymentRepository};
use club_core::{Clock, CommunityRegistry, MessengerError, MessengerResult, SystemClock};

use super::error::{ServiceError, ServiceResult};

/// Lifecycle timing knobs consumed by the services
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionSettings {
    /// Lifetime of a freshly created single-use invite
    pub invite_ttl: chrono::Duration,
    /// How long before expiry the one-time warning goes out
    pub warning_lead: chrono::Duration,
    /// Upper bound on every messenger call
    pub messenger_timeout: Duration,
}

impl Default for SubscriptionSettings {
    fn default() -> Self {
        Self {
            invite_ttl: chrono::Duration::days(1),
            warning_lead: chrono::Duration::days(1),
            messenger_timeout: Duration::from_secs(10),
        }
    }
}

impl SubscriptionSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            invite_ttl: chrono::Duration::seconds(config.subscription.invite_ttl_secs),
            warning_lead: chrono::Duration::seconds(config.subscription.warning_lead_secs),
            messenger_timeout: Duration::from_secs(config.telegram.request_timeout_secs),
        }
    }
}

/// Service context containing all dependencies
#[derive(Clone)]
pub struct ServiceContext {
    member_repo: Arc<dyn MemberRepository>,
    payment_repo: Arc<dyn PaymentRepository>,
    messenger: Arc<dyn GroupMessenger>,
    registry: Arc<CommunityRegistry>,
    clock: Arc<dyn Clock>,
    settings: SubscriptionSettings,
}

impl ServiceContext {
    pub fn new(
        member_repo: Arc<dyn MemberRepository>,
        payment_repo: Arc<dyn PaymentRepository>,
        messenger: Arc<dyn GroupMessenger>,
        registry: Arc<CommunityRegistry>,
        clock: Arc<dyn Clock>,
        settings: SubscriptionSettings,
    ) -> Self {
        Self {
            member_repo,
            payment_repo,
            messenger,
            registry,
            clock,
            settings,
        }
    }

    // === Repositories ===

    pub fn member_repo(&self) -> &dyn MemberRepository {
        self.member_repo.as_ref()
    }

    pub fn payment_repo(&self) -> &dyn PaymentRepository {
        self.payment_repo.as_ref()
    }

    // === Collaborators ===

    pub fn messenger(&self) -> &dyn GroupMessenger {
        self.messenger.as_ref()
    }

    pub fn registry(&self) -> &CommunityRegistry {
        self.registry.as_ref()
    }

    pub fn settings(&self) -> &SubscriptionSettings {
        &self.settings
    }

    /// Current instant according to the injected clock
    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    /// Await a messenger call under the configured timeout.
    /// An elapsed timeout is reported as [`MessengerError::Timeout`].
    pub async fn call_messenger<T, F>(&self, call: F) -> MessengerResult<T>
    where
        F: Future<Output = MessengerResult<T>>,
    {
        tokio::time::timeout(self.settings.messenger_timeout, call)
            .await
            .unwrap_or(Err(MessengerError::Timeout))
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("repositories", &"...")
            .field("messenger", &"...")
            .field("registry", &self.registry)
            .field("settings", &self.settings)
            .finish()
    }
}

/// Builder for creating ServiceContext with custom configuration
#[derive(Default)]
pub struct ServiceContextBuilder {
    member_repo: Option<Arc<dyn MemberRepository>>,
    payment_repo: Option<Arc<dyn PaymentRepository>>,
    messenger: Option<Arc<dyn GroupMessenger>>,
    registry: Option<Arc<CommunityRegistry>>,
    clock: Option<Arc<dyn Clock>>,
    settings: SubscriptionSettings,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn member_repo(mut self, repo: Arc<dyn MemberRepository>) -> Self {
        self.member_repo = Some(repo);
        self
    }

    pub fn payment_repo(mut self, repo: Arc<dyn PaymentRepository>) -> Self {
        self.payment_repo = Some(repo);
        self
    }

    pub fn messenger(mut self, messenger: Arc<dyn GroupMessenger>) -> Self {
        self.messenger = Some(messenger);
        self
    }

    pub fn registry(mut self, registry: CommunityRegistry) -> Self {
        self.registry = Some(Arc::new(registry));
        self
    }

    /// Defaults to [`SystemClock`]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn settings(mut self, settings: SubscriptionSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Build the ServiceContext
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if any required dependency is missing
    pub fn build(self) -> ServiceResult<ServiceContext> {
        Ok(ServiceContext::new(
            self.member_repo
                .ok_or_else(|| ServiceError::validation("member_repo is required"))?,
            self.payment_repo
                .ok_or_else(|| ServiceError::validation("payment_repo is required"))?,
            self.messenger
                .ok_or_else(|| ServiceError::validation("messenger is required"))?,
            self.registry
                .ok_or_else(|| ServiceError::validation("registry is required"))?,
            self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            self.settings,
        ))
    }
}
