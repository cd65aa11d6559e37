//! Menu filtering by role and tenant scope.
//!
//! Both filters return new trees and never touch their input. Pruning rules:
//!
//! - role filter: a node stays if the principal is admin or matches the node's
//!   requirement; a node with no path and no remaining children goes
//! - tenant filter: nodes tagged for the other scope go; a pathless group that
//!   lost all of its children goes too
//!
//! With those rules the two filters commute and each is idempotent.
//! [`visible_menu`] also drops nodes marked invisible, along with their
//! subtrees.

use std::pin::Pin;
use std::sync::Arc;

use hafez_state::ConfigState;
use tokio_stream::{Stream, StreamExt};
use tracing::debug;

use crate::principal::{Principal, observe_principal};
use crate::roles::{self, Role, RolePattern};
use crate::route_config::RouteRoleConfigStore;
use crate::routes::RouteNode;
use crate::tenant::{TenantContext, TenantScope};

pub type MenuStream = Pin<Box<dyn Stream<Item = Vec<RouteNode>> + Send + 'static>>;

/// Requirement for a node: its own patterns, else the store record for its name.
pub fn node_required_roles<'a>(node: &'a RouteNode, store: &'a RouteRoleConfigStore) -> &'a [RolePattern] {
    store.resolve_required_roles(node.required_roles.as_deref(), Some(node.name.as_str()))
}

pub fn filter_by_roles(
    nodes: &[RouteNode],
    user_roles: &[Role],
    store: &RouteRoleConfigStore,
) -> Vec<RouteNode> {
    let admin = roles::is_admin(user_roles);
    prune_by_roles(nodes, user_roles, admin, store)
}

fn prune_by_roles(
    nodes: &[RouteNode],
    user_roles: &[Role],
    admin: bool,
    store: &RouteRoleConfigStore,
) -> Vec<RouteNode> {
    nodes
        .iter()
        .filter(|node| admin || roles::has_matching_role(user_roles, node_required_roles(node, store)))
        .filter_map(|node| {
            let children = prune_by_roles(&node.children, user_roles, admin, store);
            if children.is_empty() && !node.has_path() {
                return None;
            }
            Some(node.with_replaced_children(children))
        })
        .collect()
}

pub fn filter_by_tenant(nodes: &[RouteNode], scope: TenantScope) -> Vec<RouteNode> {
    nodes
        .iter()
        .filter(|node| node.tenant_scope.is_none_or(|s| s == scope))
        .filter_map(|node| {
            let children = filter_by_tenant(&node.children, scope);
            if !node.children.is_empty() && children.is_empty() && !node.has_path() {
                return None;
            }
            Some(node.with_replaced_children(children))
        })
        .collect()
}

fn drop_invisible(nodes: &[RouteNode]) -> Vec<RouteNode> {
    nodes
        .iter()
        .filter(|node| !node.invisible)
        .map(|node| node.with_replaced_children(drop_invisible(&node.children)))
        .collect()
}

/// Both filters for one principal snapshot, without invisible entries.
pub fn visible_menu(
    nodes: &[RouteNode],
    principal: &Principal,
    scope: TenantScope,
    store: &RouteRoleConfigStore,
) -> Vec<RouteNode> {
    let shown = drop_invisible(nodes);
    filter_by_roles(&filter_by_tenant(&shown, scope), &principal.roles, store)
}

/// Re-filter `routes` by role on every principal emission.
pub fn filter_routes_by_roles(
    routes: Vec<RouteNode>,
    config_state: &dyn ConfigState,
    store: Arc<RouteRoleConfigStore>,
) -> MenuStream {
    let routes: Arc<[RouteNode]> = routes.into();
    Box::pin(observe_principal(config_state).map(move |principal| {
        let menu = filter_by_roles(&routes, &principal.roles, &store);
        debug!(roles = ?principal.role_names(), visible = menu.len(), "menu recomputed for roles");
        menu
    }))
}

/// Re-filter `routes` by scope on every tenant emission.
pub fn filter_routes_by_tenant(routes: Vec<RouteNode>, tenant: &TenantContext) -> MenuStream {
    let routes: Arc<[RouteNode]> = routes.into();
    Box::pin(tenant.observe_is_host().map(move |is_host| {
        let scope = TenantScope::from_is_host(is_host);
        let menu = filter_by_tenant(&routes, scope);
        debug!(?scope, visible = menu.len(), "menu recomputed for tenant scope");
        menu
    }))
}
