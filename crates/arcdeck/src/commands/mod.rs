//! Command dispatch: bridges CLI args -> `Console` calls -> output formatting.

pub mod config_cmd;
pub mod controllers;
pub mod refresh;
pub mod tree;
pub mod util;
pub mod watch;

use arcdeck_core::Console;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a console-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, console: &Console, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Add(args) => controllers::add(console, args, global).await,
        Command::List => controllers::list(console, global),
        Command::Edit(args) => controllers::edit(console, args, global).await,
        Command::Remove(args) => controllers::remove(console, args, global).await,
        Command::Refresh(args) => refresh::handle(console, args, global).await,
        Command::Tree(args) => tree::handle(console, args, global).await,
        Command::Watch(args) => watch::handle(console, args, global).await,
        Command::Config(_) => Err(CliError::Internal(
            "config commands run without a console".into(),
        )),
    }
}
