//! Tenant scope: HOST vs tenant.
//!
//! Session state is authoritative when it reports a tenant. Otherwise the
//! tenant id the login flow left in session storage decides, where a missing
//! value, `""` and the `"null"` literal all mean HOST.

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use hafez_core::TenantId;
use hafez_state::{ConfigState, SessionState, TenantIdStorage, TenantInfo};
use serde::{Deserialize, Serialize};
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, warn};

use crate::guard::{CanActivate, GuardContext, GuardDecision, RouteData, RouterState, admin_guard};

/// Scope a principal operates in, or a route is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantScope {
    Host,
    Tenant,
}

impl TenantScope {
    pub fn from_is_host(is_host: bool) -> Self {
        if is_host { TenantScope::Host } else { TenantScope::Tenant }
    }

    /// Scope implied by a route's `isTenant` flag.
    pub fn from_is_tenant_flag(is_tenant: Option<bool>) -> Option<Self> {
        is_tenant.map(|t| if t { TenantScope::Tenant } else { TenantScope::Host })
    }

    pub fn is_host(self) -> bool {
        self == TenantScope::Host
    }
}

pub type TenantIdStream = Pin<Box<dyn Stream<Item = Option<TenantId>> + Send + 'static>>;
pub type FlagStream = Pin<Box<dyn Stream<Item = bool> + Send + 'static>>;

fn session_tenant_id(tenant: &TenantInfo) -> Option<TenantId> {
    TenantId::from_raw(tenant.id.as_deref())
}

/// Resolves the current tenant scope from the session collaborators.
#[derive(Clone)]
pub struct TenantContext {
    config_state: Arc<dyn ConfigState>,
    session: Arc<dyn SessionState>,
    storage: Arc<dyn TenantIdStorage>,
}

impl core::fmt::Debug for TenantContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TenantContext")
            .field("current_tenant_id", &self.current_tenant_id())
            .finish_non_exhaustive()
    }
}

impl TenantContext {
    pub fn new(
        config_state: Arc<dyn ConfigState>,
        session: Arc<dyn SessionState>,
        storage: Arc<dyn TenantIdStorage>,
    ) -> Self {
        Self {
            config_state,
            session,
            storage,
        }
    }

    pub fn is_host_principal(&self) -> bool {
        match self.session.tenant() {
            Some(tenant) => session_tenant_id(&tenant).is_none() || !tenant.is_available,
            None => TenantId::from_raw(self.storage.tenant_id().as_deref()).is_none(),
        }
    }

    pub fn is_tenant_principal(&self) -> bool {
        !self.is_host_principal()
    }

    pub fn scope(&self) -> TenantScope {
        TenantScope::from_is_host(self.is_host_principal())
    }

    /// Session tenant id if present, else the stored fallback.
    pub fn current_tenant_id(&self) -> Option<TenantId> {
        self.session
            .tenant()
            .as_ref()
            .and_then(session_tenant_id)
            .or_else(|| TenantId::from_raw(self.storage.tenant_id().as_deref()))
    }

    pub fn tenant_name(&self) -> Option<String> {
        self.session
            .tenant()
            .and_then(|t| t.name)
            .filter(|name| !name.is_empty())
    }

    /// Tenant id following the `currentTenant` stream.
    ///
    /// Never yields an error: a payload without id, a failing item and a
    /// failure to subscribe all fall back to [`Self::current_tenant_id`].
    pub fn observe_tenant_id(&self) -> TenantIdStream {
        let subscription = match self.config_state.current_tenant() {
            Ok(sub) => sub,
            Err(err) => {
                warn!(error = %err, "current tenant unavailable; using session value");
                return Box::pin(tokio_stream::once(self.current_tenant_id()));
            }
        };

        let fallback = self.clone();
        Box::pin(subscription.map(move |item| match item {
            Ok(tenant) => tenant
                .as_ref()
                .and_then(session_tenant_id)
                .or_else(|| fallback.current_tenant_id()),
            Err(err) => {
                warn!(error = %err, "current tenant stream failed; using session value");
                fallback.current_tenant_id()
            }
        }))
    }

    pub fn observe_is_host(&self) -> FlagStream {
        Box::pin(self.observe_tenant_id().map(|id| id.is_none()))
    }

    pub fn observe_is_tenant(&self) -> FlagStream {
        Box::pin(self.observe_is_host().map(|is_host| !is_host))
    }

    /// Login into a tenant: session tenant and stored id are both set.
    pub fn switch_to_tenant(&self, tenant_id: &TenantId, name: Option<String>) {
        self.session
            .set_tenant(Some(TenantInfo::available(tenant_id.as_str(), name)));
        self.storage.set_tenant_id(Some(tenant_id.as_str()));
        debug!(tenant_id = %tenant_id, "switched to tenant scope");
    }

    /// Login as HOST: both tenant sources are cleared.
    pub fn switch_to_host(&self) {
        self.session.set_tenant(None);
        self.storage.clear_tenant_id();
        debug!("switched to host scope");
    }
}

/// Tenant check for a route's `isTenant` flag against the session tenant.
///
/// - `Some(true)` needs a session tenant with an id
/// - `Some(false)` needs no available session tenant
/// - `None` always passes
pub fn tenant_check(session: &dyn SessionState, route: &RouteData) -> bool {
    match route.is_tenant {
        None => true,
        Some(true) => session.tenant().as_ref().and_then(session_tenant_id).is_some(),
        Some(false) => !session.tenant().is_some_and(|t| t.is_available),
    }
}

/// Scope guard. Denies silently; never redirects.
#[derive(Debug, Clone, Copy, Default)]
pub struct TenantGuard;

#[async_trait]
impl CanActivate for TenantGuard {
    async fn can_activate(
        &self,
        ctx: &GuardContext<'_>,
        route: &RouteData,
        _state: &RouterState,
    ) -> GuardDecision {
        GuardDecision::from(tenant_check(ctx.session, route))
    }
}

/// Tenant check first (silent deny), then the admin guard.
#[derive(Debug, Clone, Copy, Default)]
pub struct TenantAdminGuard;

#[async_trait]
impl CanActivate for TenantAdminGuard {
    async fn can_activate(
        &self,
        ctx: &GuardContext<'_>,
        route: &RouteData,
        state: &RouterState,
    ) -> GuardDecision {
        if !tenant_check(ctx.session, route) {
            return GuardDecision::Deny;
        }
        admin_guard().can_activate(ctx, route, state).await
    }
}
