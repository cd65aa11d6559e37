//! Service wiring for the console.
//!
//! `ConsoleServices` owns the identity/session collaborators, the only
//! writable route-role table and the registered menu entries. Readers get
//! `Arc` snapshots of the table and the menu over `watch` channels.

use std::sync::Arc;

use anyhow::Context;
use hafez_auth::{
    GuardContext, Principal, RouteNode, RouteRoleConfig, RouteRoleConfigStore, TenantContext,
    console_routes, visible_menu,
};
use hafez_core::{DomainResult, TenantId};
use hafez_state::{
    CurrentUser, InMemoryConfigState, InMemorySessionState, SessionState, SessionStorage, TenantInfo,
};
use tokio::sync::watch;
use tracing::{debug, info};

use super::settings::ConsoleSettings;

pub struct ConsoleServices {
    pub config_state: Arc<InMemoryConfigState>,
    pub session: Arc<InMemorySessionState>,
    pub storage: Arc<SessionStorage>,
    pub tenant: TenantContext,
    route_roles: RouteRoleConfigStore,
    route_roles_tx: watch::Sender<Arc<RouteRoleConfigStore>>,
    routes_tx: watch::Sender<Arc<Vec<RouteNode>>>,
}

impl ConsoleServices {
    pub fn new(route_roles: RouteRoleConfigStore, routes: Vec<RouteNode>) -> Self {
        let config_state = Arc::new(InMemoryConfigState::new());
        let session = Arc::new(InMemorySessionState::new());
        let storage = Arc::new(SessionStorage::new());
        let tenant = TenantContext::new(config_state.clone(), session.clone(), storage.clone());

        let (route_roles_tx, _) = watch::channel(Arc::new(route_roles.clone()));
        let (routes_tx, _) = watch::channel(Arc::new(routes));

        Self {
            config_state,
            session,
            storage,
            tenant,
            route_roles,
            route_roles_tx,
            routes_tx,
        }
    }

    /// Built-in route-role table and console menu.
    pub fn seeded() -> anyhow::Result<Self> {
        Self::from_settings(&ConsoleSettings::default())
    }

    pub fn from_settings(settings: &ConsoleSettings) -> anyhow::Result<Self> {
        let route_roles = settings.load_route_roles()?;
        let routes = console_routes().context("building console menu")?;
        info!(
            route_role_entries = route_roles.len(),
            menu_roots = routes.len(),
            "console services built"
        );
        Ok(Self::new(route_roles, routes))
    }

    // ─── route-role table ───────────────────────────────────────────────────

    pub fn route_roles(&self) -> Arc<RouteRoleConfigStore> {
        self.route_roles_tx.borrow().clone()
    }

    pub fn subscribe_route_roles(&self) -> watch::Receiver<Arc<RouteRoleConfigStore>> {
        self.route_roles_tx.subscribe()
    }

    pub fn route_role_configs(&self) -> Vec<RouteRoleConfig> {
        self.route_roles.list()
    }

    pub fn add_route_role_config(&mut self, config: RouteRoleConfig) -> DomainResult<()> {
        self.route_roles.add_config(config)?;
        self.publish_route_roles();
        Ok(())
    }

    pub fn update_route_role_config(&mut self, index: usize, config: RouteRoleConfig) -> DomainResult<()> {
        self.route_roles.update_config(index, config)?;
        self.publish_route_roles();
        Ok(())
    }

    pub fn reset_route_role_configs(&mut self, configs: Vec<RouteRoleConfig>) -> DomainResult<()> {
        self.route_roles.reset_configs(configs)?;
        self.publish_route_roles();
        Ok(())
    }

    fn publish_route_roles(&self) {
        self.route_roles_tx
            .send_replace(Arc::new(self.route_roles.clone()));
        debug!(entries = self.route_roles.len(), "route-role table published");
    }

    // ─── menu entries ───────────────────────────────────────────────────────

    pub fn routes(&self) -> Arc<Vec<RouteNode>> {
        self.routes_tx.borrow().clone()
    }

    pub fn subscribe_routes(&self) -> watch::Receiver<Arc<Vec<RouteNode>>> {
        self.routes_tx.subscribe()
    }

    pub fn replace_routes(&self, routes: Vec<RouteNode>) {
        self.routes_tx.send_replace(Arc::new(routes));
    }

    // ─── sign-in state ──────────────────────────────────────────────────────

    /// Record a login: tenant scope first, then the user.
    pub fn sign_in(&self, user: CurrentUser, tenant: Option<(TenantId, Option<String>)>) {
        match tenant {
            Some((id, name)) => {
                self.tenant.switch_to_tenant(&id, name.clone());
                self.config_state
                    .set_current_tenant(Some(TenantInfo::available(id.as_str(), name)));
            }
            None => {
                self.tenant.switch_to_host();
                self.config_state.set_current_tenant(None);
            }
        }
        self.config_state.set_current_user(Some(user));
    }

    pub fn sign_out(&self) {
        self.config_state.set_current_user(None);
        self.tenant.switch_to_host();
        self.config_state.set_current_tenant(None);
    }

    pub fn principal(&self) -> Principal {
        let user = self.config_state.current_user_snapshot();
        let principal = Principal::from_user(user.as_ref());
        match self.session.tenant() {
            Some(tenant) => principal.in_tenant(tenant),
            None => principal,
        }
    }

    /// Guard collaborators, borrowing `route_roles` for the evaluation.
    pub fn guard_context<'a>(&'a self, route_roles: &'a RouteRoleConfigStore) -> GuardContext<'a> {
        GuardContext::new(self.config_state.as_ref(), self.session.as_ref(), route_roles)
    }

    /// Menu for the current snapshot of user, tenant and table.
    pub fn visible_menu(&self) -> Vec<RouteNode> {
        visible_menu(
            &self.routes(),
            &self.principal(),
            self.tenant.scope(),
            &self.route_roles(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hafez_auth::routes::route_names;
    use hafez_core::DomainError;
    use hafez_state::TenantIdStorage;

    fn tid(s: &str) -> TenantId {
        TenantId::parse(s).unwrap()
    }

    #[test]
    fn writes_are_published_as_snapshots() {
        let mut services = ConsoleServices::seeded().unwrap();
        let before = services.route_roles();
        let mut rx = services.subscribe_route_roles();

        services
            .add_route_role_config(RouteRoleConfig::new(["::Menu:reports"], ["analyst"]).unwrap())
            .unwrap();

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().len(), 5);
        assert_eq!(before.len(), 4, "old snapshot stays as it was");
        assert_eq!(services.route_role_configs().len(), 5);
    }

    #[test]
    fn rejected_write_publishes_nothing() {
        let mut services = ConsoleServices::seeded().unwrap();
        let rx = services.subscribe_route_roles();
        let config = RouteRoleConfig::new(["::Menu:x"], ["y"]).unwrap();

        assert_eq!(services.update_route_role_config(42, config), Err(DomainError::NotFound));
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn sign_in_sets_scope_and_user() {
        let services = ConsoleServices::seeded().unwrap();
        services.sign_in(CurrentUser::with_roles(["Sales"]), Some((tid("T1"), Some("Acme".into()))));

        assert!(services.tenant.is_tenant_principal());
        assert_eq!(services.storage.tenant_id().as_deref(), Some("T1"));
        let principal = services.principal();
        assert_eq!(principal.role_names(), vec!["Sales"]);
        assert_eq!(principal.tenant.and_then(|t| t.name).as_deref(), Some("Acme"));

        services.sign_out();
        assert!(services.tenant.is_host_principal());
        assert_eq!(services.principal(), Principal::anonymous());
    }

    #[test]
    fn visible_menu_for_host_admin() {
        let services = ConsoleServices::seeded().unwrap();
        services.sign_in(CurrentUser::with_roles(["admin"]), None);

        let names = route_names(&services.visible_menu())
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        assert!(names.contains(&"::Menu:Shops".to_string()));
        assert!(names.contains(&"::Menu:user".to_string()));
        assert!(!names.contains(&"::Menu:Catalog".to_string()));
    }
}
