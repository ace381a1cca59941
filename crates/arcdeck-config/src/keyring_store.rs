// ── OS keyring credential store ──
//
// `keyring` is synchronous (and may block on D-Bus), so every call runs
// on the blocking pool.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use arcdeck_core::{CoreError, CredentialKey, CredentialStore};

pub const KEYRING_SERVICE: &str = "arcdeck";

/// [`CredentialStore`] backed by the platform keyring.
#[derive(Debug, Clone)]
pub struct KeyringCredentialStore {
    service: String,
}

impl Default for KeyringCredentialStore {
    fn default() -> Self {
        Self::new(KEYRING_SERVICE)
    }
}

impl KeyringCredentialStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    async fn with_entry<T, F>(&self, key: &CredentialKey, op: F) -> Result<T, CoreError>
    where
        T: Send + 'static,
        F: FnOnce(&keyring::Entry) -> Result<T, keyring::Error> + Send + 'static,
    {
        let service = self.service.clone();
        let account = key.as_str().to_owned();
        tokio::task::spawn_blocking(move || {
            let entry = keyring::Entry::new(&service, &account).map_err(store_error)?;
            op(&entry).map_err(store_error)
        })
        .await
        .map_err(|e| CoreError::CredentialStore {
            message: format!("keyring task failed: {e}"),
        })?
    }
}

fn store_error(err: keyring::Error) -> CoreError {
    CoreError::CredentialStore {
        message: err.to_string(),
    }
}

fn absent_as_none<T>(result: Result<T, keyring::Error>) -> Result<Option<T>, keyring::Error> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(e),
    }
}

#[async_trait]
impl CredentialStore for KeyringCredentialStore {
    async fn read(&self, key: &CredentialKey) -> Result<Option<SecretString>, CoreError> {
        let found = self
            .with_entry(key, |entry| absent_as_none(entry.get_password()))
            .await?;
        tracing::debug!(key = %key.as_str(), found = found.is_some(), "keyring read");
        Ok(found.map(SecretString::from))
    }

    async fn write(&self, key: &CredentialKey, secret: &SecretString) -> Result<(), CoreError> {
        let password = secret.expose_secret().to_owned();
        self.with_entry(key, move |entry| entry.set_password(&password))
            .await
    }

    async fn delete(&self, key: &CredentialKey) -> Result<(), CoreError> {
        self.with_entry(key, |entry| {
            absent_as_none(entry.delete_credential()).map(|_| ())
        })
        .await
    }
}
