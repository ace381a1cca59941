// ── Core error types ──
//
// User-facing errors from arcdeck-core. These are NOT backend-specific:
// consumers never see HTTP status codes or JSON parse failures directly.
// `From<arcdeck_api::Error>` translates transport-layer errors into
// domain variants.
//
// `CoreError` is `Clone` and owns only strings so that a single-flight
// refresh can hand the same outcome to every waiting caller.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    // ── Interaction ──────────────────────────────────────────────────
    /// An interactive prompt was dismissed. Not a failure: the pending
    /// operation simply produces no result.
    #[error("Cancelled by user")]
    UserCancelled,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed for controller '{controller}': {message}")]
    AuthenticationFailed { controller: String, message: String },

    #[error("No password available for controller '{controller}'")]
    NoCredentials { controller: String },

    // ── Connection ───────────────────────────────────────────────────
    #[error("Cannot connect to controller at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Controller request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Data ─────────────────────────────────────────────────────────
    /// One category's fetch failed after a successful login.
    #[error("Failed to fetch {category}: {message}")]
    CategoryFetch { category: String, message: String },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Controller not found: {identifier}")]
    ControllerNotFound { identifier: String },

    // ── External stores ──────────────────────────────────────────────
    #[error("Credential store error: {message}")]
    CredentialStore { message: String },

    #[error("State store error: {message}")]
    StateStore { message: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("Backend error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// `true` for the user-cancelled outcome, which callers treat as
    /// "no result" rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::UserCancelled)
    }

    /// `true` for errors that mean the credentials were rejected.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::AuthenticationFailed { .. } | Self::NoCredentials { .. }
        )
    }

    /// Wrap an error as the failure of a single category fetch.
    pub(crate) fn category(category: impl std::fmt::Display, err: &CoreError) -> Self {
        Self::CategoryFetch {
            category: category.to_string(),
            message: err.to_string(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<arcdeck_api::Error> for CoreError {
    fn from(err: arcdeck_api::Error) -> Self {
        match err {
            arcdeck_api::Error::Authentication { message } => CoreError::AuthenticationFailed {
                controller: String::new(),
                message,
            },
            arcdeck_api::Error::SessionExpired => CoreError::AuthenticationFailed {
                controller: String::new(),
                message: "Session expired -- re-authentication required".into(),
            },
            arcdeck_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            arcdeck_api::Error::InvalidUrl(e) => CoreError::Validation {
                field: "url".into(),
                reason: e.to_string(),
            },
            arcdeck_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            arcdeck_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            arcdeck_api::Error::Backend {
                message, status, ..
            } => CoreError::Api {
                message,
                status: Some(status),
            },
            arcdeck_api::Error::NotFound { resource } => CoreError::NotFound { resource },
            arcdeck_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
