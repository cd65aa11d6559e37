//! Role-gated view fragments.
//!
//! A [`RoleGate`] picks between a fragment shown to matching principals and an
//! optional fallback. It can be evaluated once ([`RoleGate::render`]) or
//! mounted against the current-user stream, in which case it re-renders on
//! every principal change until the mounted handle is unmounted or dropped.

use hafez_state::ConfigState;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tracing::debug;

use crate::principal::observe_principal;
use crate::roles::{self, Role, RolePattern};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleGate<F> {
    required: Vec<RolePattern>,
    shown: F,
    otherwise: Option<F>,
}

impl<F> RoleGate<F> {
    pub fn new<I>(patterns: I, shown: F) -> Self
    where
        I: IntoIterator,
        I::Item: Into<RolePattern>,
    {
        Self {
            required: patterns.into_iter().map(Into::into).collect(),
            shown,
            otherwise: None,
        }
    }

    /// Single-pattern shorthand.
    pub fn single(pattern: impl Into<RolePattern>, shown: F) -> Self {
        Self::new([pattern.into()], shown)
    }

    pub fn with_else(mut self, otherwise: F) -> Self {
        self.otherwise = Some(otherwise);
        self
    }

    pub fn required(&self) -> &[RolePattern] {
        &self.required
    }

    pub fn allows(&self, user_roles: &[Role]) -> bool {
        roles::is_admin(user_roles) || roles::has_matching_role(user_roles, &self.required)
    }

    /// Fragment for `user_roles`; `None` renders nothing.
    pub fn render(&self, user_roles: &[Role]) -> Option<&F> {
        if self.allows(user_roles) {
            Some(&self.shown)
        } else {
            self.otherwise.as_ref()
        }
    }
}

impl<F> RoleGate<F>
where
    F: Clone + Send + Sync + 'static,
{
    /// Subscribe to the current user and keep the rendered fragment current.
    ///
    /// Must be called inside a tokio runtime.
    pub fn mount(self, config_state: &dyn ConfigState) -> MountedRoleGate<F> {
        let (tx, rx) = watch::channel(None);
        let mut principals = observe_principal(config_state);

        let task = tokio::spawn(async move {
            while let Some(principal) = principals.next().await {
                let fragment = self.render(&principal.roles).cloned();
                debug!(
                    roles = ?principal.role_names(),
                    shown = fragment.is_some(),
                    "role gate re-rendered"
                );
                if tx.send(fragment).is_err() {
                    break;
                }
            }
        });

        MountedRoleGate {
            rendered: rx,
            task: Some(task),
        }
    }
}

/// A mounted gate. Dropping it releases the user subscription.
#[derive(Debug)]
pub struct MountedRoleGate<F> {
    rendered: watch::Receiver<Option<F>>,
    task: Option<JoinHandle<()>>,
}

impl<F: Clone> MountedRoleGate<F> {
    /// Fragment as of the last evaluation (`None` before the first one).
    pub fn current(&self) -> Option<F> {
        self.rendered.borrow().clone()
    }

    /// Wait for the next evaluation.
    ///
    /// Returns `None` once the user stream has completed and no further
    /// evaluation can happen.
    pub async fn next_render(&mut self) -> Option<Option<F>> {
        self.rendered.changed().await.ok()?;
        Some(self.rendered.borrow_and_update().clone())
    }

    /// Stop following the user and wait until the subscription is released.
    pub async fn unmount(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
        }
    }
}

impl<F> Drop for MountedRoleGate<F> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hafez_state::{CurrentUser, InMemoryConfigState};

    fn roles(list: &[&'static str]) -> Vec<Role> {
        list.iter().copied().map(Role::from_static).collect()
    }

    #[test]
    fn render_picks_fragment() {
        let gate = RoleGate::new(["sales", "manager"], "orders-panel").with_else("upsell");
        assert_eq!(gate.render(&roles(&["SalesRep"])), Some(&"orders-panel"));
        assert_eq!(gate.render(&roles(&["Technician"])), Some(&"upsell"));
        assert_eq!(gate.render(&roles(&["SuperAdmin"])), Some(&"orders-panel"));
    }

    #[test]
    fn render_without_else_shows_nothing() {
        let gate = RoleGate::single("admin", "danger-zone");
        assert_eq!(gate.render(&roles(&["Sales"])), None);
        assert_eq!(gate.render(&roles(&[])), None);
    }

    #[test]
    fn empty_requirement_renders_for_everyone() {
        let none: [&'static str; 0] = [];
        let gate = RoleGate::new(none, "banner");
        assert_eq!(gate.render(&roles(&[])), Some(&"banner"));
    }

    #[tokio::test]
    async fn mounted_gate_follows_principal_changes() {
        let config = InMemoryConfigState::with_user(CurrentUser::with_roles(["Sales"]));
        let mut mounted = RoleGate::single("maintenance", "repairs")
            .with_else("locked")
            .mount(&config);

        assert_eq!(mounted.next_render().await, Some(Some("locked")));

        config.set_current_user(Some(CurrentUser::with_roles(["Maintenance"])));
        assert_eq!(mounted.next_render().await, Some(Some("repairs")));
        assert_eq!(mounted.current(), Some("repairs"));
    }

    #[tokio::test]
    async fn unmount_releases_subscription() {
        let config = InMemoryConfigState::with_user(CurrentUser::with_roles(["Sales"]));
        let mut mounted = RoleGate::single("sales", "panel").mount(&config);
        assert_eq!(mounted.next_render().await, Some(Some("panel")));
        assert_eq!(config.user_subscriber_count(), 1);

        mounted.unmount().await;
        assert_eq!(config.user_subscriber_count(), 0);
    }

    #[tokio::test]
    async fn completed_stream_ends_rendering() {
        use hafez_state::{CurrentTenant, StateError, Subscription};

        struct OneShot;

        impl ConfigState for OneShot {
            fn current_user(&self) -> Result<Subscription<Option<CurrentUser>>, StateError> {
                Ok(Subscription::once(Some(CurrentUser::with_roles(["Admin"]))))
            }

            fn current_tenant(&self) -> Result<Subscription<Option<CurrentTenant>>, StateError> {
                Ok(Subscription::once(None))
            }
        }

        let mut mounted = RoleGate::single("sales", "panel").mount(&OneShot);
        assert_eq!(mounted.next_render().await, Some(Some("panel")));
        assert_eq!(mounted.next_render().await, None);
    }
}
