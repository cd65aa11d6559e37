//! Navigation guards.
//!
//! A guard runs once per navigation attempt:
//!
//! ```text
//! Start → FetchPrincipal → AdminBypass → Allow
//!                        → ResolveRequiredRoles → Empty → Allow
//!                                               → NonEmpty → Match → Allow
//!                                                          → NoMatch → Redirect
//! ```
//!
//! Role guards explain a denial by redirecting to `/unauthorized` with the
//! attempted URL and the required patterns. Tenant guards (see
//! [`crate::tenant`]) deny silently.

use async_trait::async_trait;
use hafez_core::RouteName;
use hafez_state::{ConfigState, SessionState};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::principal::Principal;
use crate::roles::{self, MatchMode, RolePattern};
use crate::route_config::RouteRoleConfigStore;

/// Path of the view that explains a role denial.
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";

/// Fixed value of the `reason` query parameter.
pub const UNAUTHORIZED_REASON: &str = "unauthorized";

pub const ADMIN_ROLES: &[&str] = &["admin", "Admin"];
pub const MAINTENANCE_ROLES: &[&str] = &["maintenance", "Maintenance", "technician"];
pub const SALES_ROLES: &[&str] = &["sales", "Sales"];
pub const CUSTOMER_SERVICE_ROLES: &[&str] = &[
    "sales",
    "Sales",
    "maintenance",
    "Maintenance",
    "support",
    "Support",
    "customer-service",
];

/// Static data attached to a route definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_roles: Option<Vec<RolePattern>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu_name: Option<RouteName>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<RouteName>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_tenant: Option<bool>,
}

impl RouteData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_menu_name(mut self, name: impl Into<RouteName>) -> Self {
        self.menu_name = Some(name.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<RouteName>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_required_roles<I>(mut self, roles: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<RolePattern>,
    {
        self.required_roles = Some(roles.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_is_tenant(mut self, is_tenant: bool) -> Self {
        self.is_tenant = Some(is_tenant);
        self
    }

    /// Name used for config lookup: `menuName`, else `name`.
    pub fn lookup_name(&self) -> Option<&RouteName> {
        self.menu_name.as_ref().or(self.name.as_ref())
    }

    /// Required patterns for this route under `store`.
    pub fn required_roles_in<'a>(&'a self, store: &'a RouteRoleConfigStore) -> &'a [RolePattern] {
        store.resolve_required_roles(
            self.required_roles.as_deref(),
            self.lookup_name().map(RouteName::as_str),
        )
    }
}

/// Router state at the time of the navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterState {
    pub url: String,
}

impl RouterState {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Query parameters of the unauthorized redirect.
///
/// The three fields and their names are read by the unauthorized view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnauthorizedQuery {
    pub return_url: String,
    pub reason: String,
    pub required_roles: String,
}

impl UnauthorizedQuery {
    pub fn new(return_url: impl Into<String>, required: &[RolePattern]) -> Self {
        let required_roles = required
            .iter()
            .map(RolePattern::as_str)
            .collect::<Vec<_>>()
            .join(",");
        Self {
            return_url: return_url.into(),
            reason: UNAUTHORIZED_REASON.to_string(),
            required_roles,
        }
    }

    /// Split the comma-joined pattern list back apart.
    pub fn required_role_list(&self) -> Vec<&str> {
        if self.required_roles.is_empty() {
            return Vec::new();
        }
        self.required_roles.split(',').collect()
    }

    /// Parameters in a stable order, for whoever builds the URL.
    pub fn pairs(&self) -> [(&'static str, &str); 3] {
        [
            ("returnUrl", self.return_url.as_str()),
            ("reason", self.reason.as_str()),
            ("requiredRoles", self.required_roles.as_str()),
        ]
    }
}

/// Redirect instruction produced by a role denial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnauthorizedRedirect {
    pub path: &'static str,
    pub query: UnauthorizedQuery,
}

impl UnauthorizedRedirect {
    pub fn new(attempted_url: impl Into<String>, required: &[RolePattern]) -> Self {
        Self {
            path: UNAUTHORIZED_PATH,
            query: UnauthorizedQuery::new(attempted_url, required),
        }
    }
}

/// Outcome of a guard evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    /// Silent denial (tenant guards, or a principal stream that ended empty).
    Deny,
    /// Explained denial (role guards).
    Redirect(UnauthorizedRedirect),
}

impl GuardDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GuardDecision::Allow)
    }

    pub fn redirect(&self) -> Option<&UnauthorizedRedirect> {
        match self {
            GuardDecision::Redirect(r) => Some(r),
            _ => None,
        }
    }
}

impl From<bool> for GuardDecision {
    fn from(allowed: bool) -> Self {
        if allowed {
            GuardDecision::Allow
        } else {
            GuardDecision::Deny
        }
    }
}

/// Collaborators a guard may consult.
#[derive(Clone, Copy)]
pub struct GuardContext<'a> {
    pub config_state: &'a dyn ConfigState,
    pub session: &'a dyn SessionState,
    pub route_roles: &'a RouteRoleConfigStore,
}

impl<'a> GuardContext<'a> {
    pub fn new(
        config_state: &'a dyn ConfigState,
        session: &'a dyn SessionState,
        route_roles: &'a RouteRoleConfigStore,
    ) -> Self {
        Self {
            config_state,
            session,
            route_roles,
        }
    }
}

/// Route activation hook.
#[async_trait]
pub trait CanActivate: Send + Sync {
    async fn can_activate(
        &self,
        ctx: &GuardContext<'_>,
        route: &RouteData,
        state: &RouterState,
    ) -> GuardDecision;
}

/// Take a fresh principal snapshot: the first value of the current-user stream.
///
/// `None` means the stream completed without emitting. A stream that never
/// emits keeps this pending; there is no timeout.
pub async fn principal_snapshot(config_state: &dyn ConfigState) -> Option<Principal> {
    let subscription = match config_state.current_user() {
        Ok(sub) => sub,
        Err(err) => {
            warn!(error = %err, "current user unavailable; evaluating as anonymous");
            return Some(Principal::anonymous());
        }
    };

    match subscription.first().await {
        Some(Ok(user)) => Some(Principal::from_user(user.as_ref())),
        Some(Err(err)) => {
            warn!(error = %err, "current user stream failed; evaluating as anonymous");
            Some(Principal::anonymous())
        }
        None => None,
    }
}

/// Decide for one principal snapshot.
pub fn decide(
    principal: &Principal,
    required: &[RolePattern],
    mode: MatchMode,
    state: &RouterState,
) -> GuardDecision {
    if principal.is_admin() || required.is_empty() {
        return GuardDecision::Allow;
    }

    if mode.matches(&principal.roles, required) {
        return GuardDecision::Allow;
    }

    warn!(
        url = %state.url,
        user_roles = %principal.role_names().join(", "),
        required_roles = %required.iter().map(RolePattern::as_str).collect::<Vec<_>>().join(", "),
        mode = ?mode,
        "access denied"
    );
    GuardDecision::Redirect(UnauthorizedRedirect::new(&state.url, required))
}

/// Guard that resolves its requirement from route data and the config store.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleBasedGuard;

#[async_trait]
impl CanActivate for RoleBasedGuard {
    async fn can_activate(
        &self,
        ctx: &GuardContext<'_>,
        route: &RouteData,
        state: &RouterState,
    ) -> GuardDecision {
        let Some(principal) = principal_snapshot(ctx.config_state).await else {
            return GuardDecision::Deny;
        };
        if principal.is_admin() {
            return GuardDecision::Allow;
        }
        let required = route.required_roles_in(ctx.route_roles);
        decide(&principal, required, MatchMode::Any, state)
    }
}

/// Guard with a fixed requirement list chosen at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequireRoles {
    roles: Vec<RolePattern>,
    mode: MatchMode,
}

impl RequireRoles {
    pub fn new<I>(roles: I, mode: MatchMode) -> Self
    where
        I: IntoIterator,
        I::Item: Into<RolePattern>,
    {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
            mode,
        }
    }

    pub fn roles(&self) -> &[RolePattern] {
        &self.roles
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }
}

#[async_trait]
impl CanActivate for RequireRoles {
    async fn can_activate(
        &self,
        ctx: &GuardContext<'_>,
        _route: &RouteData,
        state: &RouterState,
    ) -> GuardDecision {
        match principal_snapshot(ctx.config_state).await {
            Some(principal) => decide(&principal, &self.roles, self.mode, state),
            None => GuardDecision::Deny,
        }
    }
}

/// Any-of guard: `require_roles(["sales", "manager"])`.
pub fn require_roles<I>(roles: I) -> RequireRoles
where
    I: IntoIterator,
    I::Item: Into<RolePattern>,
{
    RequireRoles::new(roles, MatchMode::Any)
}

/// All-of guard: the user must satisfy every pattern.
pub fn require_all_roles<I>(roles: I) -> RequireRoles
where
    I: IntoIterator,
    I::Item: Into<RolePattern>,
{
    RequireRoles::new(roles, MatchMode::All)
}

pub fn admin_guard() -> RequireRoles {
    require_roles(roles::patterns(ADMIN_ROLES))
}

pub fn maintenance_guard() -> RequireRoles {
    require_roles(roles::patterns(MAINTENANCE_ROLES))
}

pub fn sales_guard() -> RequireRoles {
    require_roles(roles::patterns(SALES_ROLES))
}

pub fn customer_service_guard() -> RequireRoles {
    require_roles(roles::patterns(CUSTOMER_SERVICE_ROLES))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hafez_state::{CurrentUser, InMemoryConfigState, InMemorySessionState, StateError, Subscription};
    use proptest::prelude::*;

    struct Fixture {
        config: InMemoryConfigState,
        session: InMemorySessionState,
        store: RouteRoleConfigStore,
    }

    impl Fixture {
        fn with_roles(roles: &[&str]) -> Self {
            Self {
                config: InMemoryConfigState::with_user(CurrentUser::with_roles(roles.iter().copied())),
                session: InMemorySessionState::new(),
                store: RouteRoleConfigStore::seeded(),
            }
        }

        fn ctx(&self) -> GuardContext<'_> {
            GuardContext::new(&self.config, &self.session, &self.store)
        }
    }

    /// Config state whose user stream is scripted per test.
    struct ScriptedUser(fn() -> Result<Subscription<Option<CurrentUser>>, StateError>);

    impl ConfigState for ScriptedUser {
        fn current_user(&self) -> Result<Subscription<Option<CurrentUser>>, StateError> {
            (self.0)()
        }

        fn current_tenant(&self) -> Result<Subscription<Option<hafez_state::CurrentTenant>>, StateError> {
            Ok(Subscription::once(None))
        }
    }

    fn state() -> RouterState {
        RouterState::new("/test-route")
    }

    #[tokio::test]
    async fn admin_is_allowed_everywhere() {
        let fx = Fixture::with_roles(&["Admin"]);
        let route = RouteData::new().with_required_roles(["maintenance"]);
        let decision = RoleBasedGuard.can_activate(&fx.ctx(), &route, &state()).await;
        assert_eq!(decision, GuardDecision::Allow);
    }

    #[tokio::test]
    async fn missing_role_redirects_with_diagnostics() {
        let fx = Fixture::with_roles(&["Sales"]);
        let route = RouteData::new().with_required_roles(["maintenance"]);
        let decision = RoleBasedGuard
            .can_activate(&fx.ctx(), &route, &RouterState::new("/maintenance-requests"))
            .await;

        let redirect = decision.redirect().expect("expected redirect");
        assert_eq!(redirect.path, "/unauthorized");
        assert_eq!(
            redirect.query,
            UnauthorizedQuery {
                return_url: "/maintenance-requests".to_string(),
                reason: "unauthorized".to_string(),
                required_roles: "maintenance".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn matching_role_is_allowed_case_insensitively() {
        let fx = Fixture::with_roles(&["MAINTENANCE"]);
        let route = RouteData::new().with_required_roles(["maintenance"]);
        let decision = RoleBasedGuard.can_activate(&fx.ctx(), &route, &state()).await;
        assert!(decision.is_allowed());
    }

    #[tokio::test]
    async fn no_requirement_allows_even_without_roles() {
        let fx = Fixture::with_roles(&[]);
        let decision = RoleBasedGuard
            .can_activate(&fx.ctx(), &RouteData::new(), &state())
            .await;
        assert!(decision.is_allowed());
    }

    #[tokio::test]
    async fn requirement_comes_from_config_by_menu_name() {
        let fx = Fixture::with_roles(&["Maintenance"]);
        let route = RouteData::new().with_menu_name("::Menu:orders");
        let decision = RoleBasedGuard.can_activate(&fx.ctx(), &route, &state()).await;

        let redirect = decision.redirect().expect("expected redirect");
        assert_eq!(redirect.query.required_roles, "sales,Sales,commerce,Commerce");
    }

    #[tokio::test]
    async fn name_is_used_when_menu_name_missing() {
        let fx = Fixture::with_roles(&["Sales"]);
        let route = RouteData::new().with_name("::Menu:diagnosis");
        let decision = RoleBasedGuard.can_activate(&fx.ctx(), &route, &state()).await;
        assert!(decision.redirect().is_some());
    }

    #[tokio::test]
    async fn explicit_empty_requirement_beats_config() {
        let fx = Fixture::with_roles(&[]);
        let none: [&'static str; 0] = [];
        let route = RouteData::new()
            .with_menu_name("::Menu:orders")
            .with_required_roles(none);
        let decision = RoleBasedGuard.can_activate(&fx.ctx(), &route, &state()).await;
        assert!(decision.is_allowed());
    }

    #[tokio::test]
    async fn require_roles_factory_is_any_of() {
        let fx = Fixture::with_roles(&["Sales"]);
        let guard = require_roles(["sales", "manager"]);
        assert!(guard.can_activate(&fx.ctx(), &RouteData::new(), &state()).await.is_allowed());

        let fx = Fixture::with_roles(&["Support"]);
        let decision = guard.can_activate(&fx.ctx(), &RouteData::new(), &state()).await;
        assert_eq!(decision.redirect().unwrap().query.required_roles, "sales,manager");
    }

    #[tokio::test]
    async fn require_all_roles_factory_is_all_of() {
        let guard = require_all_roles(["sales", "manager"]);

        let fx = Fixture::with_roles(&["Sales"]);
        assert!(guard.can_activate(&fx.ctx(), &RouteData::new(), &state()).await.redirect().is_some());

        let fx = Fixture::with_roles(&["Sales", "RegionalManager"]);
        assert!(guard.can_activate(&fx.ctx(), &RouteData::new(), &state()).await.is_allowed());

        let fx = Fixture::with_roles(&["admin"]);
        assert!(guard.can_activate(&fx.ctx(), &RouteData::new(), &state()).await.is_allowed());
    }

    #[tokio::test]
    async fn named_guards() {
        let route = RouteData::new();

        let fx = Fixture::with_roles(&["Technician"]);
        assert!(maintenance_guard().can_activate(&fx.ctx(), &route, &state()).await.is_allowed());
        assert!(!sales_guard().can_activate(&fx.ctx(), &route, &state()).await.is_allowed());

        let fx = Fixture::with_roles(&["CustomerSupport"]);
        assert!(customer_service_guard().can_activate(&fx.ctx(), &route, &state()).await.is_allowed());
        assert!(!admin_guard().can_activate(&fx.ctx(), &route, &state()).await.is_allowed());
    }

    #[tokio::test]
    async fn stream_ending_without_user_denies_silently() {
        let config = ScriptedUser(|| Ok(Subscription::empty()));
        let session = InMemorySessionState::new();
        let store = RouteRoleConfigStore::seeded();
        let ctx = GuardContext::new(&config, &session, &store);

        let decision = RoleBasedGuard.can_activate(&ctx, &RouteData::new(), &state()).await;
        assert_eq!(decision, GuardDecision::Deny);
    }

    #[tokio::test]
    async fn failing_user_stream_evaluates_as_anonymous() {
        let config = ScriptedUser(|| Ok(Subscription::failed(StateError::Closed)));
        let session = InMemorySessionState::new();
        let store = RouteRoleConfigStore::seeded();
        let ctx = GuardContext::new(&config, &session, &store);

        let open = RoleBasedGuard.can_activate(&ctx, &RouteData::new(), &state()).await;
        assert!(open.is_allowed());

        let protected = RouteData::new().with_menu_name("::Menu:user");
        let decision = RoleBasedGuard.can_activate(&ctx, &protected, &state()).await;
        assert!(decision.redirect().is_some());
    }

    #[tokio::test]
    async fn silent_user_stream_keeps_guard_pending() {
        let config = ScriptedUser(|| Ok(Subscription::pending()));
        let session = InMemorySessionState::new();
        let store = RouteRoleConfigStore::seeded();
        let ctx = GuardContext::new(&config, &session, &store);

        let route = RouteData::new();
        let st = state();
        let pending = RoleBasedGuard.can_activate(&ctx, &route, &st);
        let outcome = tokio::time::timeout(std::time::Duration::from_millis(20), pending).await;
        assert!(outcome.is_err(), "guard resolved without a principal");
    }

    #[test]
    fn required_role_list_splits_the_query() {
        let query = UnauthorizedQuery::new("/orders", &roles::patterns(&["sales", "Sales"]));
        assert_eq!(query.required_role_list(), vec!["sales", "Sales"]);
        assert_eq!(query.pairs()[1], ("reason", "unauthorized"));

        let empty = UnauthorizedQuery::new("/orders", &[]);
        assert!(empty.required_role_list().is_empty());
    }

    #[test]
    fn tenant_flag_does_not_change_role_resolution() {
        let store = RouteRoleConfigStore::seeded();
        let route = RouteData::new().with_menu_name("::Menu:user").with_is_tenant(true);
        assert_eq!(route.required_roles_in(&store).len(), 2);
    }

    fn arb_route() -> impl Strategy<Value = RouteData> {
        let names = prop::sample::select(vec![
            "::Menu:orders",
            "::Menu:user",
            "::Menu:diagnosis",
            "::Menu:Customers",
            "::Menu:unknown",
        ]);
        (
            prop::option::of(prop::collection::vec("[a-z]{1,8}", 0..4)),
            prop::option::of(names),
        )
            .prop_map(|(required, name)| {
                let mut route = RouteData::new();
                if let Some(required) = required {
                    route = route.with_required_roles(required);
                }
                if let Some(name) = name {
                    route = route.with_menu_name(name);
                }
                route
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Property: an admin-bearing role set is allowed on every route.
        #[test]
        fn admin_bypass_is_universal(
            route in arb_route(),
            others in prop::collection::vec("[A-Za-z]{1,10}", 0..4),
            admin in prop::sample::select(vec!["Admin", "administrator", "TenantAdmin", "SUPERADMIN"]),
        ) {
            let store = RouteRoleConfigStore::seeded();
            let mut roles: Vec<String> = others;
            roles.push(admin.to_string());
            let principal = Principal::with_roles(roles);

            let required = route.required_roles_in(&store);
            prop_assert_eq!(decide(&principal, required, MatchMode::Any, &state()), GuardDecision::Allow);
            prop_assert_eq!(decide(&principal, required, MatchMode::All, &state()), GuardDecision::Allow);
        }

        /// Property: a route with no data and no config entry is open to any role set.
        #[test]
        fn unconfigured_routes_are_open(
            roles in prop::collection::vec("[A-Za-z]{0,10}", 0..4),
            name in "::Menu:zz[a-z]{1,8}",
        ) {
            let store = RouteRoleConfigStore::seeded();
            let route = RouteData::new().with_name(name);
            let principal = Principal::with_roles(roles);
            let required = route.required_roles_in(&store);
            prop_assert_eq!(decide(&principal, required, MatchMode::Any, &state()), GuardDecision::Allow);
        }
    }
}
