//! `hafez-core`: shared building blocks for the console access layer.
//!
//! This crate contains identifiers and the error model only (no IO, no async).

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{RouteName, TenantId};
