use std::pin::Pin;

use hafez_state::{ConfigState, CurrentUser, TenantInfo};
use tokio_stream::{Stream, StreamExt};
use tracing::warn;

use crate::roles::{self, Role};

/// Stream of principal snapshots; never yields an error.
pub type PrincipalStream = Pin<Box<dyn Stream<Item = Principal> + Send + 'static>>;

/// The current principal as seen by the access layer.
///
/// Built from whatever the identity backend reported; a missing user or a
/// missing role list both yield an anonymous principal with no roles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Principal {
    pub roles: Vec<Role>,
    pub tenant: Option<TenantInfo>,
}

impl Principal {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_roles<I, R>(roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<Role>,
    {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
            tenant: None,
        }
    }

    pub fn from_user(user: Option<&CurrentUser>) -> Self {
        let roles = user
            .map(|u| u.roles().iter().cloned().map(Role::from).collect())
            .unwrap_or_default();
        Self { roles, tenant: None }
    }

    pub fn in_tenant(mut self, tenant: TenantInfo) -> Self {
        self.tenant = Some(tenant);
        self
    }

    pub fn is_admin(&self) -> bool {
        roles::is_admin(&self.roles)
    }

    pub fn role_names(&self) -> Vec<String> {
        self.roles.iter().map(|r| r.as_str().to_string()).collect()
    }
}

/// Follow the current user continuously.
///
/// Item errors and a failure to subscribe both degrade to the anonymous
/// principal, so consumers keep rendering something.
pub fn observe_principal(config_state: &dyn ConfigState) -> PrincipalStream {
    match config_state.current_user() {
        Ok(subscription) => Box::pin(subscription.map(|item| match item {
            Ok(user) => Principal::from_user(user.as_ref()),
            Err(err) => {
                warn!(error = %err, "current user stream failed; using anonymous principal");
                Principal::anonymous()
            }
        })),
        Err(err) => {
            warn!(error = %err, "current user unavailable; using anonymous principal");
            Box::pin(tokio_stream::once(Principal::anonymous()))
        }
    }
}
