//! Shared configuration for arcdeck.
//!
//! TOML settings loaded through figment, platform paths, the OS-keyring
//! [`CredentialStore`](arcdeck_core::CredentialStore), and the TOML file
//! that remembers known controllers between runs. Translates settings into
//! `arcdeck_core::ConsoleSettings` and `arcdeck_api::TransportConfig`.

mod keyring_store;
mod state_store;

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use arcdeck_api::{TlsMode, TransportConfig};
use arcdeck_core::ConsoleSettings;

pub use keyring_store::{KEYRING_SERVICE, KeyringCredentialStore};
pub use state_store::TomlStateStore;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,

    /// Override for where known controllers are saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Seconds between automatic refreshes in `watch`. 0 = never.
    #[serde(default)]
    pub refresh_interval_secs: u64,

    /// Allow password prompts.
    #[serde(default = "default_true")]
    pub interactive: bool,

    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    /// Accept any TLS certificate. Controllers often run with self-signed
    /// certificates inside a cluster.
    #[serde(default)]
    pub insecure: bool,

    /// Path to a custom CA certificate (PEM).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            refresh_interval_secs: 0,
            interactive: true,
            event_capacity: default_event_capacity(),
            insecure: false,
            ca_cert: None,
        }
    }
}

fn default_timeout() -> u64 {
    30
}
fn default_true() -> bool {
    true
}
fn default_event_capacity() -> usize {
    256
}

impl Config {
    pub fn console_settings(&self) -> ConsoleSettings {
        ConsoleSettings {
            interactive: self.defaults.interactive,
            refresh_interval: Duration::from_secs(self.defaults.refresh_interval_secs),
            event_capacity: self.defaults.event_capacity.max(1),
        }
    }

    pub fn transport(&self) -> TransportConfig {
        let tls = if self.defaults.insecure {
            TlsMode::DangerAcceptInvalid
        } else if let Some(ref ca) = self.defaults.ca_cert {
            TlsMode::CustomCa(ca.clone())
        } else {
            TlsMode::System
        };
        TransportConfig {
            tls,
            timeout: Duration::from_secs(self.defaults.timeout_secs),
            ..TransportConfig::default()
        }
    }

    /// Where known controllers are saved.
    pub fn state_path(&self) -> PathBuf {
        self.state_file.clone().unwrap_or_else(default_state_path)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.defaults.timeout_secs == 0 {
            return Err(ConfigError::Validation {
                field: "defaults.timeout_secs".into(),
                reason: "must be greater than zero".into(),
            });
        }
        if self.defaults.insecure && self.defaults.ca_cert.is_some() {
            return Err(ConfigError::Validation {
                field: "defaults.ca_cert".into(),
                reason: "cannot be combined with insecure = true".into(),
            });
        }
        Ok(())
    }
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "arcdeck", "arcdeck")
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("arcdeck");
    p
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback().join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Default location of the saved controller list.
pub fn default_state_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback().join("controllers.toml"),
        |dirs| dirs.data_dir().join("controllers.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the config from the canonical path plus environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` (missing file is fine) plus `ARCDECK_` environment
/// variables, e.g. `ARCDECK_DEFAULTS__TIMEOUT_SECS=10`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("ARCDECK_").split("__"));

    let config: Config = figment.extract()?;
    config.validate()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}
