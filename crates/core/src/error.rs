//! Domain error model.

use thiserror::Error;

/// Result type used across the access layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Authorization denial is *not* represented here: a denied navigation is a
/// normal outcome and travels as a guard decision, never as an error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. an empty route-name set).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An invariant of a stored structure was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier was invalid (e.g. empty tenant id).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested entry does not exist (e.g. config index out of range).
    #[error("not found")]
    NotFound,
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }
}
