//! Router harness: matches a URL to a route definition and runs its guards.

use std::sync::Arc;

use hafez_auth::{
    CanActivate, GuardDecision, NamedGuard, RoleBasedGuard, RouteData, RouterState, TenantAdminGuard,
    TenantGuard, explain_access, guard_for_path, route_data_for_path,
};
use tracing::{debug, info};

use super::services::ConsoleServices;
use super::unauthorized::{UnauthorizedView, parse_query, redirect_url, resolve};

/// One entry of the route table.
#[derive(Clone)]
pub struct RouteDefinition {
    /// Path without leading or trailing slash (`""` is the root).
    pub path: String,
    pub data: RouteData,
    pub guards: Vec<Arc<dyn CanActivate>>,
}

impl core::fmt::Debug for RouteDefinition {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RouteDefinition")
            .field("path", &self.path)
            .field("data", &self.data)
            .field("guards", &self.guards.len())
            .finish()
    }
}

impl RouteDefinition {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into().trim_matches('/').to_string(),
            data: RouteData::default(),
            guards: Vec::new(),
        }
    }

    pub fn with_data(mut self, data: RouteData) -> Self {
        self.data = data;
        self
    }

    pub fn guarded_by(mut self, guard: Arc<dyn CanActivate>) -> Self {
        self.guards.push(guard);
        self
    }

    pub fn guarded_by_named(self, guard: NamedGuard) -> Self {
        self.guarded_by(guard.into_guard())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    Activated { path: String },
    /// Role denial; carries the `/unauthorized` URL to navigate to.
    Redirected(String),
    /// Silent denial; the router stays where it is.
    Cancelled,
    NotFound,
}

#[derive(Debug, Clone, Default)]
pub struct Navigator {
    routes: Vec<RouteDefinition>,
}

impl Navigator {
    pub fn new(routes: Vec<RouteDefinition>) -> Self {
        Self { routes }
    }

    /// The console's route table.
    pub fn console() -> Self {
        Self::new(console_route_definitions())
    }

    pub fn routes(&self) -> &[RouteDefinition] {
        &self.routes
    }

    pub fn find(&self, path: &str) -> Option<&RouteDefinition> {
        let path = path.trim_matches('/');
        self.routes.iter().find(|r| r.path == path)
    }

    /// Attempt a navigation to `url`, running guards in order.
    ///
    /// The first guard that does not allow decides the outcome.
    pub async fn navigate(&self, url: &str, services: &ConsoleServices) -> NavigationOutcome {
        let Some(resolved) = resolve(url) else {
            return NavigationOutcome::NotFound;
        };
        let Some(route) = self.find(resolved.path()) else {
            debug!(url, "no route matches");
            return NavigationOutcome::NotFound;
        };

        let route_roles = services.route_roles();
        let ctx = services.guard_context(&route_roles);
        let state = RouterState::new(url);

        for guard in &route.guards {
            match guard.can_activate(&ctx, &route.data, &state).await {
                GuardDecision::Allow => continue,
                GuardDecision::Deny => {
                    debug!(url, "navigation cancelled by guard");
                    return NavigationOutcome::Cancelled;
                }
                GuardDecision::Redirect(redirect) => {
                    return NavigationOutcome::Redirected(redirect_url(&redirect));
                }
            }
        }

        info!(url, "navigation activated");
        NavigationOutcome::Activated {
            path: route.path.clone(),
        }
    }

    /// Build the view for an `/unauthorized` URL, explaining the denial of
    /// its return URL when that still matches a route.
    pub fn unauthorized_view(&self, url: &str, services: &ConsoleServices) -> Option<UnauthorizedView> {
        let principal = services.principal();
        let view = UnauthorizedView::from_url(url, &principal)?;
        let attempted = parse_query(url)
            .and_then(|q| resolve(&q.return_url))
            .and_then(|u| self.find(u.path()));
        let Some(route) = attempted else {
            return Some(view);
        };

        let explanation = explain_access(&principal, &route.data, &services.route_roles());
        debug!(
            url,
            granted = explanation.granted,
            reason = %explanation.reason,
            "explained denied navigation"
        );
        Some(view.with_explanation(explanation))
    }
}

const ADMIN_MODULES: &[(&str, &str)] = &[
    ("identity", "::Menu:Identity"),
    ("tenant-management", "::Menu:TenantManagement"),
    ("setting-management", "::Menu:SettingManagement"),
];

const TENANT_PAGES: &[(&str, &str)] = &[
    ("tenant/dashboard", "::Menu:TenantDashboard"),
    ("tenant/categories", "::Menu:Categories"),
    ("tenant/products", "::Menu:Products"),
    ("tenant/product-attributes", "::Menu:ProductAttributes"),
    ("tenant/customers", "::Menu:TenantCustomers"),
];

const HOST_PAGES: &[(&str, &str)] = &[
    ("host/dashboard", "::Menu:HostDashboard"),
    ("host/promo-codes", "::Menu:PromoCodes"),
    ("host/addresses", "::Menu:Addresses"),
    ("host/payments", "::Menu:Payments"),
];

/// Route table of the console.
pub fn console_route_definitions() -> Vec<RouteDefinition> {
    let role_based: Arc<dyn CanActivate> = Arc::new(RoleBasedGuard);
    let tenant: Arc<dyn CanActivate> = Arc::new(TenantGuard);

    let mut routes = vec![
        RouteDefinition::new("unauthorized"),
        RouteDefinition::new(""),
        RouteDefinition::new("account"),
        RouteDefinition::new("change-password"),
    ];

    for (path, menu_name) in ADMIN_MODULES {
        routes.push(
            RouteDefinition::new(*path)
                .with_data(RouteData::new().with_menu_name(*menu_name).with_required_roles(["admin"]))
                .guarded_by_named(NamedGuard::Admin),
        );
    }

    for path in hafez_auth::guard_table::guarded_paths() {
        if ADMIN_MODULES.iter().any(|(p, _)| *p == path) {
            continue;
        }
        if let Some(guard) = guard_for_path(path) {
            routes.push(
                RouteDefinition::new(path)
                    .with_data(route_data_for_path(path))
                    .guarded_by_named(guard),
            );
        }
    }

    for (path, name) in TENANT_PAGES {
        routes.push(
            RouteDefinition::new(*path)
                .with_data(RouteData::new().with_name(*name).with_is_tenant(true))
                .guarded_by(tenant.clone())
                .guarded_by(role_based.clone()),
        );
    }
    routes.push(
        RouteDefinition::new("tenant/settings")
            .with_data(RouteData::new().with_name("::Menu:TenantSettings").with_is_tenant(true))
            .guarded_by(Arc::new(TenantAdminGuard)),
    );

    for (path, name) in HOST_PAGES {
        routes.push(
            RouteDefinition::new(*path)
                .with_data(RouteData::new().with_name(*name).with_is_tenant(false))
                .guarded_by(tenant.clone())
                .guarded_by(role_based.clone()),
        );
    }

    routes
}
