//! Synchronous session tenant accessor.

use std::sync::{Arc, PoisonError, RwLock};

use crate::config_state::TenantInfo;

/// Session-level tenant state, read synchronously.
///
/// This is the first source the tenant resolver consults; the login flow is
/// the only writer.
pub trait SessionState: Send + Sync {
    fn tenant(&self) -> Option<TenantInfo>;

    fn set_tenant(&self, tenant: Option<TenantInfo>);
}

impl<S> SessionState for Arc<S>
where
    S: SessionState + ?Sized,
{
    fn tenant(&self) -> Option<TenantInfo> {
        (**self).tenant()
    }

    fn set_tenant(&self, tenant: Option<TenantInfo>) {
        (**self).set_tenant(tenant)
    }
}

/// In-memory session state for tests/dev.
#[derive(Debug, Default)]
pub struct InMemorySessionState {
    tenant: RwLock<Option<TenantInfo>>,
}

impl InMemorySessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tenant(tenant: TenantInfo) -> Self {
        Self {
            tenant: RwLock::new(Some(tenant)),
        }
    }
}

impl SessionState for InMemorySessionState {
    fn tenant(&self) -> Option<TenantInfo> {
        self.tenant.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn set_tenant(&self, tenant: Option<TenantInfo>) {
        *self.tenant.write().unwrap_or_else(PoisonError::into_inner) = tenant;
    }
}
