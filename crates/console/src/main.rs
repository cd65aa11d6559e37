use anyhow::Context;
use clap::Parser;
use hafez_console::app::{ConsoleServices, ConsoleSettings};
use hafez_console::cli::ConsoleArgs;
use hafez_state::CurrentUser;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = ConsoleArgs::parse();
    let settings = ConsoleSettings::from_env()?;
    hafez_observability::init_with(settings.log_format);

    let services = ConsoleServices::from_settings(&settings)?;
    services.sign_in(CurrentUser::with_roles(args.roles.iter().cloned()), args.sign_in_tenant());

    let menu = services.visible_menu();
    tracing::info!(scope = ?services.tenant.scope(), roots = menu.len(), "menu resolved");
    println!(
        "{}",
        serde_json::to_string_pretty(&menu).context("serializing menu")?
    );
    Ok(())
}
