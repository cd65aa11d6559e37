//! Admin console shell: navigation guards, side menu and the unauthorized view.

pub mod app;
pub mod cli;
