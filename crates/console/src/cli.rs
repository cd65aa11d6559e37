//! Command-line arguments of the `hafez-console` binary.

use clap::Parser;
use hafez_core::TenantId;

/// Print the side menu a user would see, as JSON.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "hafez-console", version)]
pub struct ConsoleArgs {
    /// Sign in to this tenant instead of HOST.
    #[arg(long, value_name = "TENANT_ID", value_parser = TenantId::parse)]
    pub tenant: Option<TenantId>,

    /// Display name of the tenant.
    #[arg(long, value_name = "NAME", requires = "tenant")]
    pub tenant_name: Option<String>,

    /// Role names of the signed-in user.
    #[arg(value_name = "ROLE")]
    pub roles: Vec<String>,
}

impl ConsoleArgs {
    /// Tenant to sign in to, in the shape `ConsoleServices::sign_in` takes.
    pub fn sign_in_tenant(&self) -> Option<(TenantId, Option<String>)> {
        self.tenant
            .clone()
            .map(|id| (id, self.tenant_name.clone()))
    }
}
