//! `hafez-auth`: role- and tenant-based route/menu access for the console.
//!
//! This is a navigation guard layer, not a security boundary: the backend
//! enforces authorization on its own. Everything here decides what the
//! console shows and where it lets the user navigate.

pub mod explain;
pub mod gate;
pub mod guard;
pub mod guard_table;
pub mod menu;
pub mod principal;
pub mod roles;
pub mod route_config;
pub mod routes;
pub mod tenant;

pub use explain::{AccessExplanation, RequirementSource, explain_access};
pub use gate::{MountedRoleGate, RoleGate};
pub use guard::{
    CanActivate, GuardContext, GuardDecision, RequireRoles, RoleBasedGuard, RouteData, RouterState,
    UNAUTHORIZED_PATH, UnauthorizedQuery, UnauthorizedRedirect, admin_guard, customer_service_guard,
    maintenance_guard, require_all_roles, require_roles, sales_guard,
};
pub use guard_table::{NamedGuard, guard_for_path, route_data_for_path};
pub use menu::{
    MenuStream, filter_by_roles, filter_by_tenant, filter_routes_by_roles, filter_routes_by_tenant,
    visible_menu,
};
pub use principal::{Principal, observe_principal};
pub use roles::{MatchMode, Role, RolePattern, has_all_roles, has_matching_role, is_admin};
pub use route_config::{RouteRoleConfig, RouteRoleConfigStore, default_route_role_configs};
pub use routes::{Layout, RouteNode, build_route_tree, console_routes};
pub use tenant::{TenantAdminGuard, TenantContext, TenantGuard, TenantScope, tenant_check};
