//! Terminal password prompt.
//!
//! An empty answer cancels the login; the core turns that into
//! `UserCancelled` rather than an error.

use async_trait::async_trait;
use secrecy::SecretString;

use arcdeck_core::{CoreError, PasswordPrompt, PromptReason, PromptRequest};

pub struct TerminalPrompt;

fn prompt_err(e: impl std::fmt::Display) -> CoreError {
    CoreError::Validation {
        field: "password".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn banner(request: &PromptRequest) -> String {
    let why = match request.reason {
        PromptReason::FirstConnect => "Connecting to",
        PromptReason::MissingPassword => "Password needed for",
        PromptReason::Reauthenticate => "Login rejected; re-enter the password for",
    };
    format!(
        "{why} {} ({}@{})",
        request.controller, request.username, request.url
    )
}

fn ask(request: &PromptRequest) -> Result<Option<SecretString>, CoreError> {
    eprintln!("{}", banner(request));

    let password = if request.confirm {
        dialoguer::Password::new()
            .with_prompt("Password (empty to cancel)")
            .with_confirmation("Confirm password", "Passwords do not match")
            .allow_empty_password(true)
            .interact()
            .map_err(prompt_err)?
    } else {
        rpassword::prompt_password("Password (empty to cancel): ").map_err(prompt_err)?
    };

    if password.is_empty() {
        return Ok(None);
    }
    Ok(Some(SecretString::from(password)))
}

#[async_trait]
impl PasswordPrompt for TerminalPrompt {
    async fn prompt(&self, request: PromptRequest) -> Result<Option<SecretString>, CoreError> {
        tokio::task::spawn_blocking(move || ask(&request))
            .await
            .map_err(prompt_err)?
    }
}
