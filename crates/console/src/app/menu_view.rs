//! Live side-menu view.
//!
//! Recomputes the visible menu whenever the user, the tenant scope, the
//! route-role table or the registered entries change. Nothing is published
//! until both a principal and a scope have been observed.

use std::sync::Arc;

use hafez_auth::{Principal, RouteNode, TenantScope, observe_principal, visible_menu};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tracing::debug;

use super::services::ConsoleServices;

pub type Menu = Arc<Vec<RouteNode>>;

/// A mounted menu view. Dropping it releases every subscription.
#[derive(Debug)]
pub struct MenuView {
    menu: watch::Receiver<Option<Menu>>,
    task: Option<JoinHandle<()>>,
}

impl MenuView {
    /// Must be called inside a tokio runtime.
    pub fn mount(services: &ConsoleServices) -> Self {
        let mut principals = observe_principal(services.config_state.as_ref());
        let mut is_host = services.tenant.observe_is_host();
        let mut route_roles = services.subscribe_route_roles();
        let mut routes = services.subscribe_routes();
        let (tx, rx) = watch::channel(None);

        let task = tokio::spawn(async move {
            let mut principal: Option<Principal> = None;
            let mut scope: Option<TenantScope> = None;

            loop {
                tokio::select! {
                    Some(next) = principals.next() => principal = Some(next),
                    Some(host) = is_host.next() => scope = Some(TenantScope::from_is_host(host)),
                    Ok(()) = route_roles.changed() => {}
                    Ok(()) = routes.changed() => {}
                    else => break,
                }

                let (Some(principal), Some(scope)) = (&principal, scope) else {
                    continue;
                };
                let store = route_roles.borrow_and_update().clone();
                let entries = routes.borrow_and_update().clone();
                let menu = visible_menu(&entries, principal, scope, &store);
                debug!(
                    roles = ?principal.role_names(),
                    ?scope,
                    visible = menu.len(),
                    "side menu recomputed"
                );
                if tx.send(Some(Arc::new(menu))).is_err() {
                    break;
                }
            }
        });

        Self {
            menu: rx,
            task: Some(task),
        }
    }

    /// Menu as of the last recomputation.
    pub fn current(&self) -> Option<Menu> {
        self.menu.borrow().clone()
    }

    /// Wait for the next recomputation; `None` once the view can no longer change.
    pub async fn next_menu(&mut self) -> Option<Menu> {
        loop {
            self.menu.changed().await.ok()?;
            if let Some(menu) = self.menu.borrow_and_update().clone() {
                return Some(menu);
            }
        }
    }

    /// Wait until the menu satisfies `predicate`.
    pub async fn wait_for<P>(&mut self, mut predicate: P) -> Option<Menu>
    where
        P: FnMut(&[RouteNode]) -> bool,
    {
        if let Some(menu) = self.current().filter(|m| predicate(m.as_slice())) {
            return Some(menu);
        }
        loop {
            let menu = self.next_menu().await?;
            if predicate(menu.as_slice()) {
                return Some(menu);
            }
        }
    }

    pub async fn unmount(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
        }
    }
}

impl Drop for MenuView {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
