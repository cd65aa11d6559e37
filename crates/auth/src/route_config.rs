//! Route-to-role configuration.
//!
//! Each record lists the menu entries it controls (by exact route name) and the
//! role patterns that may see them. Special rules:
//!
//! - Admin roles always have full access (handled by the callers)
//! - Routes without a record are visible to everyone
//! - Role matching is case-insensitive substring matching
//!
//! The store is a plain owned value. Mutation needs `&mut`, so exactly one
//! owner (the composition root) can write; readers get cloned snapshots.

use hafez_core::{DomainError, DomainResult, RouteName};
use serde::{Deserialize, Serialize};

use crate::roles::RolePattern;

/// Access rule for a group of menu entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRoleConfig {
    pub route_name_patterns: Vec<RouteName>,
    pub required_role_patterns: Vec<RolePattern>,

    /// Only the listed roles may see these entries. Informational: matching
    /// already restricts to the listed roles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_exclusive: Option<bool>,
}

impl RouteRoleConfig {
    pub fn new<N, R>(route_names: N, required_roles: R) -> DomainResult<Self>
    where
        N: IntoIterator,
        N::Item: Into<RouteName>,
        R: IntoIterator,
        R::Item: Into<RolePattern>,
    {
        let config = Self {
            route_name_patterns: route_names.into_iter().map(Into::into).collect(),
            required_role_patterns: required_roles.into_iter().map(Into::into).collect(),
            is_exclusive: None,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn exclusive(mut self) -> Self {
        self.is_exclusive = Some(true);
        self
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.route_name_patterns.is_empty() {
            return Err(DomainError::validation("routeNamePatterns must not be empty"));
        }
        Ok(())
    }

    /// Exact membership test (route names are not substring-matched).
    pub fn covers(&self, route_name: &str) -> bool {
        self.route_name_patterns.iter().any(|n| n.as_str() == route_name)
    }
}

/// Ordered collection of [`RouteRoleConfig`] records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteRoleConfigStore {
    configs: Vec<RouteRoleConfig>,
}

impl RouteRoleConfigStore {
    pub fn new(configs: Vec<RouteRoleConfig>) -> DomainResult<Self> {
        for config in &configs {
            config.validate()?;
        }
        Ok(Self { configs })
    }

    /// Store seeded with the console's built-in table.
    pub fn seeded() -> Self {
        Self {
            configs: default_route_role_configs(),
        }
    }

    /// Parse a JSON array of records (camelCase keys).
    pub fn from_json(raw: &str) -> DomainResult<Self> {
        let configs: Vec<RouteRoleConfig> =
            serde_json::from_str(raw).map_err(|e| DomainError::validation(e.to_string()))?;
        Self::new(configs)
    }

    /// First record whose route-name set contains `route_name` exactly.
    pub fn find_config(&self, route_name: &str) -> Option<&RouteRoleConfig> {
        self.configs.iter().find(|c| c.covers(route_name))
    }

    pub fn add_config(&mut self, config: RouteRoleConfig) -> DomainResult<()> {
        config.validate()?;
        self.configs.push(config);
        Ok(())
    }

    /// Replace the record at `index`. Out-of-range indexes leave the store unchanged.
    pub fn update_config(&mut self, index: usize, config: RouteRoleConfig) -> DomainResult<()> {
        config.validate()?;
        let slot = self.configs.get_mut(index).ok_or(DomainError::NotFound)?;
        *slot = config;
        Ok(())
    }

    /// Replace every record. All-or-nothing: one invalid record rejects the set.
    pub fn reset_configs(&mut self, configs: Vec<RouteRoleConfig>) -> DomainResult<()> {
        *self = Self::new(configs)?;
        Ok(())
    }

    pub fn list(&self) -> Vec<RouteRoleConfig> {
        self.configs.clone()
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    /// Required role patterns for a route.
    ///
    /// Priority: patterns attached to the route itself (an empty list still
    /// wins and means open access), then the record for `route_name`, then none.
    pub fn resolve_required_roles<'a>(
        &'a self,
        explicit: Option<&'a [RolePattern]>,
        route_name: Option<&str>,
    ) -> &'a [RolePattern] {
        if let Some(explicit) = explicit {
            return explicit;
        }
        route_name
            .and_then(|name| self.find_config(name))
            .map(|c| c.required_role_patterns.as_slice())
            .unwrap_or(&[])
    }
}

fn seed(route_names: &[&'static str], roles: &[&'static str]) -> RouteRoleConfig {
    RouteRoleConfig {
        route_name_patterns: route_names.iter().copied().map(RouteName::from_static).collect(),
        required_role_patterns: crate::roles::patterns(roles),
        is_exclusive: None,
    }
}

/// Built-in route-role table.
pub fn default_route_role_configs() -> Vec<RouteRoleConfig> {
    vec![
        // Maintenance
        seed(
            &[
                "::Menu:maintenance-requests",
                "::Menu:maintenance-requests-scheduled",
                "::Menu:maintenance-requests-list",
                "::Menu:diagnosis",
            ],
            &["maintenance", "Maintenance", "technician", "Technician"],
        ),
        // Sales
        seed(
            &["::Menu:orders", "::Menu:Catalog", "::Menu:Categories", "::Menu:Products"],
            &["sales", "Sales", "commerce", "Commerce"],
        ),
        // Customer service (shared by several roles)
        seed(
            &["::Menu:Customers", "::Menu:Complaints", "::Menu:CommonIssues"],
            &[
                "sales",
                "Sales",
                "maintenance",
                "Maintenance",
                "support",
                "Support",
                "customer-service",
                "CustomerService",
            ],
        ),
        // Admin only
        seed(&["::Menu:user", "::Menu:Technicians"], &["admin", "Admin"]),
    ]
}
