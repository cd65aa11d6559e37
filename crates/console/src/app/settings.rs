//! Console settings from the environment.

use std::path::PathBuf;

use anyhow::Context;
use hafez_auth::RouteRoleConfigStore;
use hafez_observability::LogFormat;
use tracing::info;

/// Optional path to a JSON route-role table that replaces the built-in one.
pub const ROUTE_ROLES_ENV: &str = "HAFEZ_ROUTE_ROLES";

/// `json` (default) or `pretty`.
pub const LOG_FORMAT_ENV: &str = "HAFEZ_LOG_FORMAT";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsoleSettings {
    pub route_roles_path: Option<PathBuf>,
    pub log_format: LogFormat,
}

impl ConsoleSettings {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let route_roles_path = lookup(ROUTE_ROLES_ENV)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        let log_format = match lookup(LOG_FORMAT_ENV).filter(|v| !v.trim().is_empty()) {
            Some(raw) => raw
                .parse::<LogFormat>()
                .with_context(|| format!("invalid {LOG_FORMAT_ENV}"))?,
            None => LogFormat::default(),
        };

        Ok(Self {
            route_roles_path,
            log_format,
        })
    }

    /// The route-role table: the configured file if any, else the built-in seed.
    pub fn load_route_roles(&self) -> anyhow::Result<RouteRoleConfigStore> {
        let Some(path) = &self.route_roles_path else {
            return Ok(RouteRoleConfigStore::seeded());
        };

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading route-role table {}", path.display()))?;
        let store = RouteRoleConfigStore::from_json(&raw)
            .with_context(|| format!("parsing route-role table {}", path.display()))?;

        info!(path = %path.display(), entries = store.len(), "route-role table loaded");
        Ok(store)
    }
}
