//! Navigation tree model.
//!
//! The routing collaborator hands out flat entries linked by `parentName`;
//! [`build_route_tree`] assembles them into the hierarchy the menu filters
//! work on.

use std::collections::{HashMap, HashSet};

use hafez_core::{DomainError, DomainResult, RouteName};
use serde::{Deserialize, Serialize};

use crate::roles::RolePattern;
use crate::tenant::TenantScope;

/// Page layout a menu entry renders in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    #[default]
    Application,
    Account,
    Empty,
}

/// A navigable menu entry and its sub-entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteNode {
    pub name: RouteName,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default)]
    pub children: Vec<RouteNode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_scope: Option<TenantScope>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_roles: Option<Vec<RolePattern>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_class: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,

    #[serde(default)]
    pub layout: Layout,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_name: Option<RouteName>,

    #[serde(default)]
    pub invisible: bool,
}

impl RouteNode {
    pub fn new(name: impl Into<RouteName>) -> Self {
        Self {
            name: name.into(),
            path: None,
            children: Vec::new(),
            tenant_scope: None,
            required_roles: None,
            icon_class: None,
            order: None,
            layout: Layout::default(),
            parent_name: None,
            invisible: false,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_children(mut self, children: Vec<RouteNode>) -> Self {
        self.children = children;
        self
    }

    pub fn with_tenant_scope(mut self, scope: TenantScope) -> Self {
        self.tenant_scope = Some(scope);
        self
    }

    pub fn tenant_only(self) -> Self {
        self.with_tenant_scope(TenantScope::Tenant)
    }

    pub fn host_only(self) -> Self {
        self.with_tenant_scope(TenantScope::Host)
    }

    pub fn with_required_roles<I>(mut self, roles: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<RolePattern>,
    {
        self.required_roles = Some(roles.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_icon(mut self, icon_class: impl Into<String>) -> Self {
        self.icon_class = Some(icon_class.into());
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    pub fn under(mut self, parent: impl Into<RouteName>) -> Self {
        self.parent_name = Some(parent.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.invisible = true;
        self
    }

    /// An empty path string counts as no path.
    pub fn has_path(&self) -> bool {
        self.path.as_deref().is_some_and(|p| !p.is_empty())
    }

    /// Copy of this node with `children` in place of its own.
    pub fn with_replaced_children(&self, children: Vec<RouteNode>) -> Self {
        Self {
            name: self.name.clone(),
            path: self.path.clone(),
            children,
            tenant_scope: self.tenant_scope,
            required_roles: self.required_roles.clone(),
            icon_class: self.icon_class.clone(),
            order: self.order,
            layout: self.layout,
            parent_name: self.parent_name.clone(),
            invisible: self.invisible,
        }
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(RouteNode::count).sum::<usize>()
    }

    /// Depth-first search by name.
    pub fn find(&self, name: &str) -> Option<&RouteNode> {
        if self.name.as_str() == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }
}

/// Depth-first search over a forest.
pub fn find_route<'a>(nodes: &'a [RouteNode], name: &str) -> Option<&'a RouteNode> {
    nodes.iter().find_map(|n| n.find(name))
}

/// Names in depth-first order.
pub fn route_names(nodes: &[RouteNode]) -> Vec<&str> {
    let mut out = Vec::new();
    fn walk<'a>(nodes: &'a [RouteNode], out: &mut Vec<&'a str>) {
        for node in nodes {
            out.push(node.name.as_str());
            walk(&node.children, out);
        }
    }
    walk(nodes, &mut out);
    out
}

/// Assemble flat entries into a tree.
///
/// Siblings are ordered by `order` (entries without one go last, ties keep
/// input order). Duplicate names, unknown parents and parent cycles are
/// rejected.
pub fn build_route_tree(entries: Vec<RouteNode>) -> DomainResult<Vec<RouteNode>> {
    let mut names = HashSet::with_capacity(entries.len());
    for entry in &entries {
        if !names.insert(entry.name.clone()) {
            return Err(DomainError::invariant(format!(
                "duplicate route name {}",
                entry.name
            )));
        }
    }
    let parents = entries
        .iter()
        .filter_map(|e| e.parent_name.as_ref().map(|p| (&e.name, p)));
    for (name, parent) in parents {
        if !names.contains(parent) {
            return Err(DomainError::invariant(format!(
                "route {name} has unknown parent {parent}"
            )));
        }
    }

    let expected: usize = entries.iter().map(RouteNode::count).sum();
    let mut by_parent: HashMap<Option<RouteName>, Vec<RouteNode>> = HashMap::new();
    for entry in entries {
        by_parent.entry(entry.parent_name.clone()).or_default().push(entry);
    }

    let roots = attach(None, &mut by_parent);
    let placed: usize = roots.iter().map(RouteNode::count).sum();
    if placed != expected {
        return Err(DomainError::invariant("route parents form a cycle"));
    }
    Ok(roots)
}

fn attach(
    parent: Option<RouteName>,
    by_parent: &mut HashMap<Option<RouteName>, Vec<RouteNode>>,
) -> Vec<RouteNode> {
    let mut nodes = by_parent.remove(&parent).unwrap_or_default();
    nodes.sort_by_key(|n| n.order.unwrap_or(i32::MAX));
    for node in &mut nodes {
        let children = attach(Some(node.name.clone()), by_parent);
        node.children.extend(children);
    }
    nodes
}

/// Flat menu entries of the console, as registered at start-up.
pub fn console_route_entries() -> Vec<RouteNode> {
    vec![
        RouteNode::new("::Menu:TenantDashboard")
            .with_path("/tenant/dashboard")
            .with_icon("material-icons-outlined|dashboard")
            .with_order(1)
            .tenant_only(),
        RouteNode::new("::Menu:Catalog")
            .with_path("/")
            .with_icon("material-icons-outlined|inventory_2")
            .with_order(2)
            .tenant_only(),
        RouteNode::new("::Menu:Categories")
            .with_path("/tenant/categories")
            .with_icon("material-icons-round|category")
            .with_order(3)
            .under("::Menu:Catalog")
            .tenant_only(),
        RouteNode::new("::Menu:Products")
            .with_path("/tenant/products")
            .with_icon("pi pi-objects-column")
            .with_order(4)
            .under("::Menu:Catalog")
            .tenant_only(),
        RouteNode::new("::Menu:ProductAttributes")
            .with_path("/tenant/product-attributes")
            .with_icon("pi pi-objects-column")
            .with_order(5)
            .under("::Menu:Catalog")
            .tenant_only(),
        RouteNode::new("::Menu:user")
            .with_path("/users")
            .with_icon("material-icons-sharp|admin_panel_settings")
            .with_order(14),
        RouteNode::new("::Menu:Shops")
            .with_path("/shops")
            .with_icon("material-icons-outlined|store")
            .with_order(15)
            .host_only(),
        RouteNode::new("::Menu:HostDashboard")
            .with_path("/host/dashboard")
            .with_icon("material-icons-outlined|dashboard")
            .with_order(1)
            .host_only(),
        RouteNode::new("::Menu:PromoCodes")
            .with_path("/host/promo-codes")
            .with_icon("material-icons-outlined|local_offer")
            .with_order(16)
            .host_only(),
        RouteNode::new("::Menu:Addresses")
            .with_path("/host/addresses")
            .with_icon("material-icons-outlined|location_on")
            .with_order(17)
            .host_only(),
        RouteNode::new("::Menu:Payments")
            .with_path("/host/payments")
            .with_icon("material-icons-outlined|payment")
            .with_order(18)
            .host_only(),
        RouteNode::new("::Menu:TenantCustomers")
            .with_path("/tenant/customers")
            .with_icon("material-icons-round|people")
            .with_order(5)
            .tenant_only(),
        RouteNode::new("::Menu:TenantSettings")
            .with_path("/tenant/settings")
            .with_icon("material-icons-outlined|settings")
            .with_order(6)
            .tenant_only(),
    ]
}

/// The console's menu tree.
pub fn console_routes() -> DomainResult<Vec<RouteNode>> {
    build_route_tree(console_route_entries())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn console_menu_nests_catalog_children() {
        let tree = console_routes().unwrap();
        let catalog = find_route(&tree, "::Menu:Catalog").unwrap();
        assert_eq!(
            route_names(&catalog.children),
            vec!["::Menu:Categories", "::Menu:Products", "::Menu:ProductAttributes"]
        );
        assert_eq!(tree.iter().map(RouteNode::count).sum::<usize>(), 13);
    }

    #[test]
    fn siblings_are_ordered_and_unordered_go_last() {
        let tree = build_route_tree(vec![
            RouteNode::new("c"),
            RouteNode::new("b").with_order(2),
            RouteNode::new("a").with_order(1),
            RouteNode::new("d"),
        ])
        .unwrap();
        assert_eq!(route_names(&tree), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = build_route_tree(vec![RouteNode::new("a"), RouteNode::new("a")]).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn unknown_parent_is_rejected() {
        let err = build_route_tree(vec![RouteNode::new("a").under("missing")]).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn parent_cycle_is_rejected() {
        let err = build_route_tree(vec![
            RouteNode::new("a").under("b"),
            RouteNode::new("b").under("a"),
        ])
        .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn empty_path_is_no_path() {
        assert!(!RouteNode::new("x").has_path());
        assert!(!RouteNode::new("x").with_path("").has_path());
        assert!(RouteNode::new("x").with_path("/").has_path());
    }

    #[test]
    fn node_json_uses_camel_case_and_tenant_scope() {
        let node = RouteNode::new("::Menu:Shops").with_path("/shops").host_only();
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["tenantScope"], "host");
        assert_eq!(json["layout"], "application");

        let back: RouteNode = serde_json::from_value(json).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn layout_and_visibility_come_from_json() {
        let node: RouteNode = serde_json::from_value(serde_json::json!({
            "name": "::Menu:Login",
            "path": "/account/login",
            "layout": "account",
            "invisible": true
        }))
        .unwrap();
        assert_eq!(node.layout, Layout::Account);
        assert!(node.invisible);
    }
}
