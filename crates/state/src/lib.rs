//! `hafez-state`: the identity/session collaborators the access layer reads.
//!
//! The console never owns this state; it observes it. This crate defines the
//! read interfaces (streams and snapshots) plus in-memory implementations for
//! tests and embedding.

pub mod config_state;
pub mod error;
pub mod in_memory;
pub mod session;
pub mod storage;

pub use config_state::{ConfigState, CurrentTenant, CurrentUser, Subscription, TenantInfo};
pub use error::StateError;
pub use in_memory::InMemoryConfigState;
pub use session::{InMemorySessionState, SessionState};
pub use storage::{SessionStorage, TENANT_HEADER_NAME, TENANT_STORAGE_KEY, TenantIdStorage, tenant_header};
