//! Shared helpers for command handlers.

use std::sync::Arc;

use arcdeck_core::{Console, ControllerHandle};

use crate::error::CliError;

/// Controllers a command applies to: the named one, or every known one.
pub fn select(
    console: &Console,
    identifier: Option<&str>,
) -> Result<Vec<Arc<ControllerHandle>>, CliError> {
    if let Some(identifier) = identifier {
        return Ok(vec![console.find(identifier)?]);
    }
    Ok(console
        .controllers()
        .iter()
        .filter_map(|c| console.get(c.id))
        .collect())
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}
