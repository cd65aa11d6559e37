//! Strongly-typed identifiers used across the access layer.

use core::str::FromStr;
use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Literal some identity backends and session storage use for "no tenant".
const NULL_LITERAL: &str = "null";

/// Identifier of a tenant (multi-tenant boundary).
///
/// Never empty and never the literal `"null"`: both of those mean HOST scope
/// and are represented by the absence of a `TenantId`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantId(Cow<'static, str>);

/// Stable identifier of a navigable menu entry (e.g. `::Menu:orders`).
///
/// Distinct from the URL path of the entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteName(Cow<'static, str>);

macro_rules! impl_str_newtype {
    ($t:ty) => {
        impl $t {
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

        impl From<$t> for String {
            fn from(value: $t) -> Self {
                value.0.into_owned()
            }
        }
    };
}

impl_str_newtype!(TenantId);
impl_str_newtype!(RouteName);

impl TenantId {
    /// Parse a tenant id, rejecting empty values and the `"null"` literal.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        Self::try_from(s.to_string())
    }

    /// Normalize a raw stored value: missing, empty and `"null"` all mean HOST.
    pub fn from_raw(raw: Option<&str>) -> Option<Self> {
        raw.and_then(|s| Self::parse(s).ok())
    }
}

impl TryFrom<String> for TenantId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value == NULL_LITERAL {
            return Err(DomainError::invalid_id("TenantId: null literal"));
        }
        if value.trim().is_empty() {
            return Err(DomainError::invalid_id("TenantId: empty"));
        }
        Ok(Self(Cow::Owned(value)))
    }
}

impl FromStr for TenantId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl FromStr for RouteName {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(DomainError::invalid_id("RouteName: empty"));
        }
        Ok(Self(Cow::Owned(s.to_string())))
    }
}

impl RouteName {
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }
}

impl From<&'static str> for RouteName {
    fn from(value: &'static str) -> Self {
        Self::from_static(value)
    }
}

impl From<String> for RouteName {
    fn from(value: String) -> Self {
        Self(Cow::Owned(value))
    }
}
