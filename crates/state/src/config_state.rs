//! Observable application-configuration state (mechanics only).
//!
//! The identity backend publishes two values the access layer cares about:
//! the current user and the current tenant. Both are exposed as streams that
//! emit the current value on subscription and then every change, the way a
//! behaviour-subject style config store does.
//!
//! ## Consumption patterns
//!
//! - **One-shot**: guards take the first emitted value and drop the subscription.
//! - **Continuous**: menus and role gates keep the subscription for the lifetime
//!   of their view and release it on teardown.
//!
//! Payloads are tolerant: a missing user, a missing `roles` field or a `null`
//! tenant all decode and mean "no roles" / "HOST".

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use serde::{Deserialize, Serialize};
use tokio_stream::{Stream, StreamExt};

use crate::error::StateError;

/// The authenticated user as reported by the identity backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub user_name: Option<String>,

    #[serde(default)]
    pub is_authenticated: bool,

    /// Raw role names. `None` (absent or `null` in the payload) means no roles.
    #[serde(default)]
    pub roles: Option<Vec<String>>,
}

impl CurrentUser {
    pub fn with_roles<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            is_authenticated: true,
            roles: Some(roles.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// Role names, treating a missing list as empty.
    pub fn roles(&self) -> &[String] {
        self.roles.as_deref().unwrap_or(&[])
    }

    /// Decode a user payload as produced by the application-configuration endpoint.
    pub fn from_json(raw: &str) -> Result<Option<Self>, StateError> {
        serde_json::from_str::<Option<Self>>(raw).map_err(|e| StateError::malformed(e.to_string()))
    }
}

/// Tenant descriptor shared by the session accessor and the config-state stream.
///
/// `id` is kept raw here; normalization (empty / `"null"` → HOST) is the
/// resolver's job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantInfo {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub is_available: bool,
}

impl TenantInfo {
    pub fn available(id: impl Into<String>, name: Option<String>) -> Self {
        Self {
            id: Some(id.into()),
            name,
            is_available: true,
        }
    }
}

/// Payload of the `currentTenant` stream.
pub type CurrentTenant = TenantInfo;

type BoxStateStream<T> = Pin<Box<dyn Stream<Item = Result<T, StateError>> + Send + 'static>>;

/// A subscription to a config-state value.
///
/// Dropping the subscription releases it; there is no separate unsubscribe call.
pub struct Subscription<T> {
    inner: BoxStateStream<T>,
}

impl<T> Subscription<T> {
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<T, StateError>> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
        }
    }

    /// A subscription that emits `value` once and completes.
    pub fn once(value: T) -> Self
    where
        T: Send + 'static,
    {
        Self::new(tokio_stream::once(Ok(value)))
    }

    /// A subscription whose only item is `err`.
    pub fn failed(err: StateError) -> Self
    where
        T: Send + 'static,
    {
        Self::new(tokio_stream::once(Err(err)))
    }

    /// A subscription that completes without emitting.
    pub fn empty() -> Self
    where
        T: Send + 'static,
    {
        Self::new(tokio_stream::empty())
    }

    /// A subscription that never emits and never completes.
    pub fn pending() -> Self
    where
        T: Send + 'static,
    {
        Self::new(tokio_stream::pending())
    }

    /// Wait for the next emission. `None` once the producer completes.
    pub async fn recv(&mut self) -> Option<Result<T, StateError>> {
        self.inner.next().await
    }

    /// Take the first emission and drop the subscription.
    pub async fn first(mut self) -> Option<Result<T, StateError>> {
        self.recv().await
    }
}

impl<T> Stream for Subscription<T> {
    type Item = Result<T, StateError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl<T> fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

/// Read side of the application-configuration store.
///
/// Opening a subscription may itself fail (store not initialised); callers
/// decide how to degrade.
pub trait ConfigState: Send + Sync {
    fn current_user(&self) -> Result<Subscription<Option<CurrentUser>>, StateError>;

    fn current_tenant(&self) -> Result<Subscription<Option<CurrentTenant>>, StateError>;
}

impl<S> ConfigState for Arc<S>
where
    S: ConfigState + ?Sized,
{
    fn current_user(&self) -> Result<Subscription<Option<CurrentUser>>, StateError> {
        (**self).current_user()
    }

    fn current_tenant(&self) -> Result<Subscription<Option<CurrentTenant>>, StateError> {
        (**self).current_tenant()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_payload_tolerates_null_and_missing_roles() {
        let user = CurrentUser::from_json(r#"{"userName":"ali","roles":null}"#)
            .unwrap()
            .unwrap();
        assert!(user.roles().is_empty());

        let user = CurrentUser::from_json(r#"{"userName":"ali"}"#).unwrap().unwrap();
        assert!(user.roles().is_empty());

        assert_eq!(CurrentUser::from_json("null").unwrap(), None);
    }

    #[test]
    fn user_payload_keeps_role_order() {
        let user = CurrentUser::from_json(r#"{"roles":["Sales","Maintenance"]}"#)
            .unwrap()
            .unwrap();
        assert_eq!(user.roles(), &["Sales".to_string(), "Maintenance".to_string()]);
    }

    #[test]
    fn malformed_payload_is_reported() {
        let err = CurrentUser::from_json(r#"{"roles":42}"#).unwrap_err();
        assert!(matches!(err, StateError::Malformed(_)));
    }

    #[tokio::test]
    async fn first_takes_a_single_emission() {
        let sub = Subscription::new(tokio_stream::iter(vec![Ok(1), Ok(2)]));
        assert_eq!(sub.first().await, Some(Ok(1)));
    }

    #[tokio::test]
    async fn empty_subscription_completes_without_value() {
        let sub = Subscription::<u8>::empty();
        assert_eq!(sub.first().await, None);
    }
}
