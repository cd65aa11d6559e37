//! Console application wiring.
//!
//! - `settings.rs`: environment-driven settings
//! - `services.rs`: identity/session collaborators plus the route-role table
//! - `navigation.rs`: route table and guard evaluation per navigation
//! - `unauthorized.rs`: the `/unauthorized` redirect URL and view model
//! - `menu_view.rs`: live side menu

pub mod menu_view;
pub mod navigation;
pub mod services;
pub mod settings;
pub mod unauthorized;

pub use menu_view::{Menu, MenuView};
pub use navigation::{NavigationOutcome, Navigator, RouteDefinition, console_route_definitions};
pub use services::ConsoleServices;
pub use settings::ConsoleSettings;
pub use unauthorized::UnauthorizedView;
