//! Role names, role patterns and the matching rules between them.
//!
//! Matching is a case-insensitive, unanchored substring test: the pattern
//! `"maintenance"` is satisfied by a role named `"MaintenanceManager"`, and
//! `"sales"` by `"WholesalesManager"`. Those loose matches are part of the
//! contract.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Substring that marks a role as an administrator role.
const ADMIN_MARKER: &str = "admin";

/// Exact (case-folded) administrator role name.
const ADMINISTRATOR: &str = "administrator";

/// Role identifier as reported by the identity backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

/// A lowercase-ish substring loosely matched against role names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RolePattern(Cow<'static, str>);

macro_rules! impl_role_str {
    ($t:ty) => {
        impl $t {
            pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
                Self(name.into())
            }

            pub const fn from_static(name: &'static str) -> Self {
                Self(Cow::Borrowed(name))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $t {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<&'static str> for $t {
            fn from(value: &'static str) -> Self {
                Self::from_static(value)
            }
        }

        impl From<String> for $t {
            fn from(value: String) -> Self {
                Self(Cow::Owned(value))
            }
        }
    };
}

impl_role_str!(Role);
impl_role_str!(RolePattern);

/// Build owned patterns from a static list.
pub fn patterns(list: &[&'static str]) -> Vec<RolePattern> {
    list.iter().copied().map(RolePattern::from_static).collect()
}

fn contains_folded(role: &str, pattern: &str) -> bool {
    role.to_lowercase().contains(&pattern.to_lowercase())
}

/// True if any role contains `"admin"` (case-insensitively) or is `"administrator"`.
///
/// Admins bypass every role check in the access layer.
pub fn is_admin<R: AsRef<str>>(roles: &[R]) -> bool {
    roles.iter().any(|role| {
        let folded = role.as_ref().to_lowercase();
        folded.contains(ADMIN_MARKER) || folded == ADMINISTRATOR
    })
}

/// True if any user role contains any required pattern.
///
/// No required patterns means no restriction.
pub fn has_matching_role<R, P>(user_roles: &[R], required: &[P]) -> bool
where
    R: AsRef<str>,
    P: AsRef<str>,
{
    if required.is_empty() {
        return true;
    }
    required.iter().any(|pattern| {
        user_roles
            .iter()
            .any(|role| contains_folded(role.as_ref(), pattern.as_ref()))
    })
}

/// True if every required pattern is contained in at least one user role.
pub fn has_all_roles<R, P>(user_roles: &[R], required: &[P]) -> bool
where
    R: AsRef<str>,
    P: AsRef<str>,
{
    required.iter().all(|pattern| {
        user_roles
            .iter()
            .any(|role| contains_folded(role.as_ref(), pattern.as_ref()))
    })
}

/// How a requirement list is combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// At least one pattern must match (OR).
    #[default]
    Any,
    /// Every pattern must match (AND).
    All,
}

impl MatchMode {
    pub fn matches<R, P>(self, user_roles: &[R], required: &[P]) -> bool
    where
        R: AsRef<str>,
        P: AsRef<str>,
    {
        match self {
            MatchMode::Any => has_matching_role(user_roles, required),
            MatchMode::All => has_all_roles(user_roles, required),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const NONE: [&str; 0] = [];

    #[test]
    fn admin_detection() {
        assert!(is_admin(&["Admin"]));
        assert!(is_admin(&["TenantAdmin"]));
        assert!(is_admin(&["administrator"]));
        assert!(is_admin(&["Sales", "SYSADMIN"]));
        assert!(!is_admin(&["Sales", "Maintenance"]));
        assert!(!is_admin(&NONE));
    }

    #[test]
    fn substring_matching_is_case_insensitive() {
        assert!(has_matching_role(&["MAINTENANCE"], &["maintenance"]));
        assert!(has_matching_role(&["MaintenanceManager"], &["maintenance"]));
        assert!(!has_matching_role(&["Sales"], &["maintenance"]));
    }

    #[test]
    fn matching_is_not_anchored() {
        assert!(has_matching_role(&["Salesperson"], &["sales"]));
        assert!(has_matching_role(&["WholesalesManager"], &["sales"]));
        assert!(has_matching_role(&["NonSalesDept"], &["sales"]));
    }

    #[test]
    fn empty_requirement_is_open_access() {
        assert!(has_matching_role(&NONE, &NONE));
        assert!(has_matching_role(&["Sales"], &NONE));
        assert!(has_all_roles(&NONE, &NONE));
    }

    #[test]
    fn no_roles_never_satisfy_a_requirement() {
        assert!(!has_matching_role(&NONE, &["sales"]));
        assert!(!has_all_roles(&NONE, &["sales"]));
    }

    #[test]
    fn all_roles_requires_every_pattern() {
        let roles = ["Sales", "Maintenance"];
        assert!(has_all_roles(&roles, &["sales", "maintenance"]));
        assert!(!has_all_roles(&roles, &["sales", "support"]));
        // One role may satisfy several patterns.
        assert!(has_all_roles(&["SalesSupport"], &["sales", "support"]));
    }

    #[test]
    fn match_mode_dispatch() {
        let roles = [Role::from_static("Sales")];
        let required = patterns(&["sales", "support"]);
        assert!(MatchMode::Any.matches(&roles, &required));
        assert!(!MatchMode::All.matches(&roles, &required));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: any role list containing an "admin"-bearing role is admin,
        /// regardless of case or surrounding text.
        #[test]
        fn any_admin_bearing_role_is_admin(
            prefix in "[a-zA-Z]{0,8}",
            suffix in "[a-zA-Z]{0,8}",
            upper in any::<bool>(),
            others in prop::collection::vec("[a-zA-Z]{1,10}", 0..5),
        ) {
            let marker = if upper { "ADMIN" } else { "admin" };
            let mut roles = others;
            roles.push(format!("{prefix}{marker}{suffix}"));
            prop_assert!(is_admin(&roles));
        }

        /// Property: a role always matches patterns cut out of itself, in any case.
        #[test]
        fn role_matches_its_own_substrings(
            role in "[a-zA-Z]{1,16}",
            start in 0usize..16,
            len in 1usize..16,
        ) {
            let start = start.min(role.len() - 1);
            let end = (start + len).min(role.len());
            let pattern = role[start..end].to_uppercase();
            prop_assert!(has_matching_role(&[role.as_str()], &[pattern.as_str()]));
        }
    }
}
