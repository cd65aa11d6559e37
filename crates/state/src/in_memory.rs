//! In-memory config state for tests/dev.

use tokio::sync::watch;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::WatchStream;

use crate::config_state::{ConfigState, CurrentTenant, CurrentUser, Subscription};
use crate::error::StateError;

/// In-memory application-configuration store.
///
/// - Subscribers get the current value immediately, then every replacement
/// - Setting a value never fails, even with no subscribers
#[derive(Debug)]
pub struct InMemoryConfigState {
    user: watch::Sender<Option<CurrentUser>>,
    tenant: watch::Sender<Option<CurrentTenant>>,
}

impl InMemoryConfigState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(user: CurrentUser) -> Self {
        let state = Self::new();
        state.set_current_user(Some(user));
        state
    }

    pub fn set_current_user(&self, user: Option<CurrentUser>) {
        self.user.send_replace(user);
    }

    pub fn set_current_tenant(&self, tenant: Option<CurrentTenant>) {
        self.tenant.send_replace(tenant);
    }

    pub fn current_user_snapshot(&self) -> Option<CurrentUser> {
        self.user.borrow().clone()
    }

    pub fn current_tenant_snapshot(&self) -> Option<CurrentTenant> {
        self.tenant.borrow().clone()
    }

    /// Live subscriptions to the current user.
    pub fn user_subscriber_count(&self) -> usize {
        self.user.receiver_count()
    }
}

impl Default for InMemoryConfigState {
    fn default() -> Self {
        let (user, _) = watch::channel(None);
        let (tenant, _) = watch::channel(None);
        Self { user, tenant }
    }
}

impl ConfigState for InMemoryConfigState {
    fn current_user(&self) -> Result<Subscription<Option<CurrentUser>>, StateError> {
        let stream = WatchStream::new(self.user.subscribe()).map(Ok);
        Ok(Subscription::new(stream))
    }

    fn current_tenant(&self) -> Result<Subscription<Option<CurrentTenant>>, StateError> {
        let stream = WatchStream::new(self.tenant.subscribe()).map(Ok);
        Ok(Subscription::new(stream))
    }
}
