//! Session-scoped key/value storage and the tenant-id fallback kept in it.
//!
//! The login flow writes the tenant id here independently of the identity
//! backend; outgoing requests read it back to attach the tenant header. The
//! storage lives as long as the browser session (never persisted across restarts).

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Storage key holding the tenant id.
pub const TENANT_STORAGE_KEY: &str = "abp_tenant_id";

/// Request header carrying the tenant id to the backend.
pub const TENANT_HEADER_NAME: &str = "__tenant";

/// Tenant-id fallback accessor.
pub trait TenantIdStorage: Send + Sync {
    /// Raw stored value (may be empty or the `"null"` literal).
    fn tenant_id(&self) -> Option<String>;

    /// Store `tenant_id`; `None` or an empty value removes the key.
    fn set_tenant_id(&self, tenant_id: Option<&str>);

    fn clear_tenant_id(&self) {
        self.set_tenant_id(None);
    }
}

impl<S> TenantIdStorage for Arc<S>
where
    S: TenantIdStorage + ?Sized,
{
    fn tenant_id(&self) -> Option<String> {
        (**self).tenant_id()
    }

    fn set_tenant_id(&self, tenant_id: Option<&str>) {
        (**self).set_tenant_id(tenant_id)
    }

    fn clear_tenant_id(&self) {
        (**self).clear_tenant_id()
    }
}

/// In-memory session storage (string keys, plain-text values).
#[derive(Debug, Default)]
pub struct SessionStorage {
    items: RwLock<HashMap<String, String>>,
}

impl SessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_item(&self, key: &str) -> Option<String> {
        let items = self.items.read().unwrap_or_else(PoisonError::into_inner);
        items.get(key).cloned()
    }

    pub fn set_item(&self, key: &str, value: impl Into<String>) {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        items.insert(key.to_string(), value.into());
    }

    pub fn remove_item(&self, key: &str) {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        items.remove(key);
    }

    /// End of session: everything goes.
    pub fn clear(&self) {
        self.items.write().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl TenantIdStorage for SessionStorage {
    fn tenant_id(&self) -> Option<String> {
        self.get_item(TENANT_STORAGE_KEY)
    }

    fn set_tenant_id(&self, tenant_id: Option<&str>) {
        match tenant_id {
            Some(id) if !id.is_empty() => self.set_item(TENANT_STORAGE_KEY, id),
            _ => self.remove_item(TENANT_STORAGE_KEY),
        }
    }
}

/// Header to attach to an outgoing request, if a tenant id is stored.
pub fn tenant_header(storage: &dyn TenantIdStorage) -> Option<(&'static str, String)> {
    storage
        .tenant_id()
        .filter(|id| !id.is_empty())
        .map(|id| (TENANT_HEADER_NAME, id))
}
