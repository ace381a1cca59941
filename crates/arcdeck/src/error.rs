//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` variants into user-facing errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use arcdeck_config::ConfigError;
use arcdeck_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const CANCELLED: i32 = 130;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to controller at {url}")]
    #[diagnostic(
        code(arcdeck::connection_failed),
        help(
            "{reason}\n\
             Check that the controller is running and reachable.\n\
             Self-signed certificate? Retry with --insecure (-k)."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(arcdeck::timeout),
        help("Increase the timeout with --timeout or check controller responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed for {controller}")]
    #[diagnostic(
        code(arcdeck::auth_failed),
        help("{message}\nRun: arcdeck refresh {controller} --reauth")
    )]
    AuthFailed { controller: String, message: String },

    #[error("No password available for {controller}")]
    #[diagnostic(
        code(arcdeck::no_credentials),
        help("Run without --non-interactive to be prompted for the password.")
    )]
    NoCredentials { controller: String },

    #[error("Cancelled")]
    #[diagnostic(code(arcdeck::cancelled))]
    Cancelled,

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(arcdeck::not_found),
        help("Run: arcdeck {list_command} to see what is available")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("Refresh incomplete: {failed} categor{} failed", plural_suffix(.failed))]
    #[diagnostic(
        code(arcdeck::refresh_incomplete),
        help("Cached data for the failed categories is kept. Re-run with -v for details.")
    )]
    RefreshIncomplete { failed: usize },

    // ── Backend ──────────────────────────────────────────────────────
    #[error("Controller error{}: {message}", status_suffix(.status))]
    #[diagnostic(code(arcdeck::api_error))]
    Api { message: String, status: Option<u16> },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(arcdeck::validation))]
    Validation { field: String, reason: String },

    // ── Storage ──────────────────────────────────────────────────────
    #[error("Credential store error: {message}")]
    #[diagnostic(
        code(arcdeck::keyring),
        help("Is a secret service (or the platform keychain) available?")
    )]
    CredentialStore { message: String },

    #[error("Could not read or write the controller list: {message}")]
    #[diagnostic(code(arcdeck::state), help("Point --state at a writable file."))]
    StateStore { message: String },

    #[error(transparent)]
    #[diagnostic(code(arcdeck::config))]
    Config(#[from] ConfigError),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(arcdeck::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render TOML: {0}")]
    #[diagnostic(code(arcdeck::toml))]
    Toml(#[from] toml::ser::Error),

    #[error("{0}")]
    #[diagnostic(code(arcdeck::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::Cancelled => exit_code::CANCELLED,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::Config(ConfigError::Validation { .. }) => {
                exit_code::USAGE
            }
            Self::Api {
                status: Some(409), ..
            } => exit_code::CONFLICT,
            _ => exit_code::GENERAL,
        }
    }
}

// thiserror hands fields over by reference.
#[allow(clippy::trivially_copy_pass_by_ref)]
fn plural_suffix(count: &usize) -> &'static str {
    if *count == 1 { "y" } else { "ies" }
}

#[allow(clippy::ref_option)]
fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({s})")).unwrap_or_default()
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UserCancelled => CliError::Cancelled,

            CoreError::AuthenticationFailed {
                controller,
                message,
            } => CliError::AuthFailed {
                controller,
                message,
            },

            CoreError::NoCredentials { controller } => CliError::NoCredentials { controller },

            CoreError::ConnectionFailed { url, reason } => {
                CliError::ConnectionFailed { url, reason }
            }

            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            CoreError::ControllerNotFound { identifier } => CliError::NotFound {
                resource_type: "controller".into(),
                identifier,
                list_command: "list".into(),
            },

            CoreError::NotFound { resource } => CliError::NotFound {
                resource_type: "resource".into(),
                identifier: resource,
                list_command: "tree".into(),
            },

            CoreError::Validation { field, reason } => CliError::Validation { field, reason },

            CoreError::CategoryFetch { category, message } => CliError::Api {
                message: format!("{category}: {message}"),
                status: None,
            },

            CoreError::Api { message, status } => CliError::Api { message, status },

            CoreError::CredentialStore { message } => CliError::CredentialStore { message },

            CoreError::StateStore { message } => CliError::StateStore { message },

            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}
