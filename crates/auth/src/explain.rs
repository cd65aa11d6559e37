//! Access explanation for the unauthorized view and audit logs.
//!
//! Answers "why was this navigation allowed or denied?" using the same rules
//! as the role guards.

use serde::Serialize;

use crate::guard::RouteData;
use crate::principal::Principal;
use crate::roles::{self, RolePattern};
use crate::route_config::RouteRoleConfigStore;

/// Where the requirement for a route came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementSource {
    /// Patterns attached to the route itself.
    RouteData,
    /// A record in the route-role table.
    ConfigTable,
    /// Nothing configured: open access.
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    MissingRole,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DenialReason {
    pub kind: DenialKind,
    pub message: String,
    pub suggestions: Vec<String>,
}

/// Detailed explanation of one access decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessExplanation {
    /// Route name the requirement was looked up by, if any.
    pub route_name: Option<String>,

    pub granted: bool,

    /// Human-readable reason for the decision.
    pub reason: String,

    pub user_roles: Vec<String>,
    pub required_patterns: Vec<String>,
    pub requirement_source: RequirementSource,
    pub admin_bypass: bool,

    /// Required patterns some user role contains.
    pub matched_patterns: Vec<String>,

    pub denial_reason: Option<DenialReason>,
}

/// Explain whether `principal` may enter `route`.
pub fn explain_access(
    principal: &Principal,
    route: &RouteData,
    store: &RouteRoleConfigStore,
) -> AccessExplanation {
    let route_name = route.lookup_name().map(|n| n.as_str().to_string());
    let required = route.required_roles_in(store);
    let requirement_source = if route.required_roles.is_some() {
        RequirementSource::RouteData
    } else if route_name.as_deref().and_then(|n| store.find_config(n)).is_some() {
        RequirementSource::ConfigTable
    } else {
        RequirementSource::None
    };

    let user_roles = principal.role_names();
    let required_patterns: Vec<String> = required.iter().map(|p| p.as_str().to_string()).collect();
    let matched_patterns: Vec<String> = required
        .iter()
        .filter(|p| roles::has_matching_role(&principal.roles, std::slice::from_ref(*p)))
        .map(|p| p.as_str().to_string())
        .collect();
    let admin_bypass = principal.is_admin();

    let base = AccessExplanation {
        route_name,
        granted: true,
        reason: String::new(),
        user_roles,
        required_patterns,
        requirement_source,
        admin_bypass,
        matched_patterns,
        denial_reason: None,
    };

    if admin_bypass {
        return AccessExplanation {
            reason: "Principal holds an admin role; role checks are bypassed".to_string(),
            ..base
        };
    }
    if required.is_empty() {
        return AccessExplanation {
            reason: "No role requirement is configured for this route".to_string(),
            ..base
        };
    }
    if !base.matched_patterns.is_empty() {
        let reason = format!("Principal roles match {:?}", base.matched_patterns);
        return AccessExplanation { reason, ..base };
    }

    denied(base, required)
}

fn denied(base: AccessExplanation, required: &[RolePattern]) -> AccessExplanation {
    let wanted = required
        .iter()
        .map(RolePattern::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    let mut suggestions = vec![format!("Assign a role whose name contains one of: {wanted}")];
    if base.requirement_source == RequirementSource::ConfigTable {
        suggestions.push(
            "Or extend the route-role table entry for this route with an existing role".to_string(),
        );
    }

    AccessExplanation {
        granted: false,
        reason: format!(
            "Principal roles {:?} match none of the required patterns [{wanted}]",
            base.user_roles
        ),
        denial_reason: Some(DenialReason {
            kind: DenialKind::MissingRole,
            message: format!("Missing a role matching: {wanted}"),
            suggestions,
        }),
        ..base
    }
}
