//! Route path → guard and route path → route data tables.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::guard::{
    CanActivate, RequireRoles, RouteData, admin_guard, customer_service_guard, maintenance_guard,
    sales_guard,
};

/// The reusable role guards routes are wired to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamedGuard {
    Maintenance,
    Sales,
    CustomerService,
    Admin,
}

impl NamedGuard {
    pub fn guard(self) -> RequireRoles {
        match self {
            NamedGuard::Maintenance => maintenance_guard(),
            NamedGuard::Sales => sales_guard(),
            NamedGuard::CustomerService => customer_service_guard(),
            NamedGuard::Admin => admin_guard(),
        }
    }

    pub fn into_guard(self) -> Arc<dyn CanActivate> {
        Arc::new(self.guard())
    }
}

const GUARD_TABLE: &[(&str, NamedGuard)] = &[
    ("maintenance-requests", NamedGuard::Maintenance),
    ("maintenance-requests-list", NamedGuard::Maintenance),
    ("maintenance-requests/scheduled", NamedGuard::Maintenance),
    ("diagnoses", NamedGuard::Maintenance),
    ("orders", NamedGuard::Sales),
    ("categories", NamedGuard::Sales),
    ("products", NamedGuard::Sales),
    ("customers", NamedGuard::CustomerService),
    ("complaints", NamedGuard::CustomerService),
    ("common-issues", NamedGuard::CustomerService),
    ("users", NamedGuard::Admin),
    ("shops", NamedGuard::Admin),
    ("technicians", NamedGuard::Admin),
    ("advertisements", NamedGuard::Admin),
    ("identity", NamedGuard::Admin),
    ("tenant-management", NamedGuard::Admin),
    ("setting-management", NamedGuard::Admin),
];

const MAINTENANCE: &[&str] = &["maintenance", "Maintenance"];
const SALES: &[&str] = &["sales", "Sales"];
const ADMIN: &[&str] = &["admin", "Admin"];
const CUSTOMER_SERVICE: &[&str] = &["sales", "Sales", "maintenance", "Maintenance", "support"];
const COMMON_ISSUES: &[&str] = &["maintenance", "Maintenance", "support"];

const ROUTE_DATA_TABLE: &[(&str, &str, &[&str])] = &[
    ("maintenance-requests", "::Menu:maintenance-requests", MAINTENANCE),
    ("maintenance-requests-list", "::Menu:maintenance-requests-list", MAINTENANCE),
    ("diagnoses", "::Menu:diagnosis", MAINTENANCE),
    ("technicians", "::Menu:Technicians", ADMIN),
    ("orders", "::Menu:orders", SALES),
    ("categories", "::Menu:Categories", SALES),
    ("products", "::Menu:Products", SALES),
    ("customers", "::Menu:Customers", CUSTOMER_SERVICE),
    ("complaints", "::Menu:Complaints", CUSTOMER_SERVICE),
    ("common-issues", "::Menu:CommonIssues", COMMON_ISSUES),
    ("users", "::Menu:user", ADMIN),
    ("shops", "::Menu:Shops", ADMIN),
    ("advertisements", "::Menu:Advertisements", ADMIN),
];

/// Guard wired to a route path, if any.
pub fn guard_for_path(path: &str) -> Option<NamedGuard> {
    GUARD_TABLE
        .iter()
        .find(|(p, _)| *p == path)
        .map(|(_, guard)| *guard)
}

/// Static data for a route path; empty when the path is not listed.
pub fn route_data_for_path(path: &str) -> RouteData {
    ROUTE_DATA_TABLE
        .iter()
        .find(|(p, _, _)| *p == path)
        .map(|(_, menu_name, roles)| {
            RouteData::new()
                .with_menu_name(*menu_name)
                .with_required_roles(roles.iter().copied())
        })
        .unwrap_or_default()
}

/// Every path the guard table knows, in table order.
pub fn guarded_paths() -> impl Iterator<Item = &'static str> {
    GUARD_TABLE.iter().map(|(p, _)| *p)
}
