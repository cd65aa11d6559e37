use thiserror::Error;

/// Failure reading from an identity/session collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    /// The backing store could not produce a value (not loaded yet, lock poisoned, ...).
    #[error("state unavailable: {0}")]
    Unavailable(String),

    /// The stream's producer went away.
    #[error("state stream closed")]
    Closed,

    /// The payload could not be decoded.
    #[error("malformed state payload: {0}")]
    Malformed(String),
}

impl StateError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }
}
