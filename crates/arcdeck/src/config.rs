//! CLI configuration -- thin wrapper around `arcdeck_config`.
//!
//! Applies `GlobalOpts` flag overrides on top of the loaded file and
//! assembles the `Console` with the real backend, keyring and state file.

use std::sync::Arc;

use arcdeck_api::HttpBackend;
use arcdeck_config::{KeyringCredentialStore, TomlStateStore};
use arcdeck_core::{Console, CoreError, PasswordPrompt};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::prompt::TerminalPrompt;

pub use arcdeck_config::{Config, config_path, load_config_from, save_config_to};

/// Config file path: `--config` / `ARCDECK_CONFIG`, else the platform default.
pub fn resolved_config_path(global: &GlobalOpts) -> std::path::PathBuf {
    global.config.clone().unwrap_or_else(config_path)
}

/// Load the config file and apply command-line overrides.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut cfg = load_config_from(&resolved_config_path(global))?;

    if let Some(ref state) = global.state {
        cfg.state_file = Some(state.clone());
    }
    if global.insecure {
        cfg.defaults.insecure = true;
        cfg.defaults.ca_cert = None;
    }
    if let Some(timeout) = global.timeout {
        cfg.defaults.timeout_secs = timeout;
    }
    if global.non_interactive {
        cfg.defaults.interactive = false;
    }
    cfg.validate()?;
    Ok(cfg)
}

/// Build a console and load the saved controllers into it.
pub async fn open_console(cfg: &Config) -> Result<Console, CliError> {
    let backend = HttpBackend::new(&cfg.transport()).map_err(CoreError::from)?;
    let settings = cfg.console_settings();
    let prompt: Option<Arc<dyn PasswordPrompt>> = if settings.interactive {
        Some(Arc::new(TerminalPrompt))
    } else {
        None
    };
    let state_path = cfg.state_path();

    let console = Console::new(
        Arc::new(backend),
        Arc::new(KeyringCredentialStore::default()),
        prompt,
        Arc::new(TomlStateStore::new(&state_path)),
        settings,
    );
    let count = console.load().await?;
    tracing::debug!(state = %state_path.display(), count, "console ready");
    Ok(console)
}
