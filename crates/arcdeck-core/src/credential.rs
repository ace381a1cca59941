// ── Credential resolution ──
//
// The broker finds a usable password for a controller: first from the
// external credential store, then from an interactive prompt supplied by
// the UI host. It never retries on its own; the session manager decides
// whether to ask again after a rejected login.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};
use url::Url;

use arcdeck_api::ResourceType;

use crate::error::CoreError;
use crate::model::{ControllerId, ControllerIdentity};

// ── CredentialKey ───────────────────────────────────────────────────

/// Composite key addressing one secret in the credential store.
///
/// `controllerId` for the controller's own login, or
/// `controllerId::resourceType::instanceName` for a managed resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CredentialKey(String);

impl CredentialKey {
    pub fn controller(id: ControllerId) -> Self {
        Self(id.to_string())
    }

    pub fn resource(id: ControllerId, resource_type: ResourceType, instance_name: &str) -> Self {
        Self(format!("{id}::{resource_type}::{instance_name}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CredentialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── External interfaces ─────────────────────────────────────────────

/// Secure key/value storage for passwords.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// `Ok(None)` when nothing is stored under `key`.
    async fn read(&self, key: &CredentialKey) -> Result<Option<SecretString>, CoreError>;

    async fn write(&self, key: &CredentialKey, secret: &SecretString) -> Result<(), CoreError>;

    /// Removing a missing key is not an error.
    async fn delete(&self, key: &CredentialKey) -> Result<(), CoreError>;
}

/// Why the user is being asked for a password.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptReason {
    /// Adding a controller for the first time.
    FirstConnect,
    /// Nothing stored (or storing is disabled).
    MissingPassword,
    /// The previous password was rejected or re-auth was requested.
    Reauthenticate,
}

/// What the UI host shows when it asks for a password.
#[derive(Debug, Clone)]
pub struct PromptRequest {
    pub controller: String,
    pub url: Url,
    pub username: String,
    pub reason: PromptReason,
    /// Ask for the password twice and require both entries to match.
    pub confirm: bool,
}

/// Interactive password entry, implemented by the UI host.
#[async_trait]
pub trait PasswordPrompt: Send + Sync {
    /// `Ok(None)` when the user dismissed the prompt.
    async fn prompt(&self, request: PromptRequest) -> Result<Option<SecretString>, CoreError>;
}

// ── Resolution ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct ResolveOptions {
    pub allow_interactive: bool,
    /// Consult the credential store before prompting.
    pub use_stored: bool,
    pub reason: PromptReason,
}

/// Where a resolved password came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordSource {
    Store,
    Prompt,
}

#[derive(Debug)]
pub enum ResolvedPassword {
    Password {
        secret: SecretString,
        source: PasswordSource,
    },
    UserCancelled,
    NotFound,
}

/// Resolves controller passwords from the credential store or the user.
pub struct CredentialBroker {
    store: Arc<dyn CredentialStore>,
    prompt: Option<Arc<dyn PasswordPrompt>>,
}

impl CredentialBroker {
    pub fn new(store: Arc<dyn CredentialStore>, prompt: Option<Arc<dyn PasswordPrompt>>) -> Self {
        Self { store, prompt }
    }

    /// `true` if a UI host prompt is available.
    pub fn can_prompt(&self) -> bool {
        self.prompt.is_some()
    }

    pub async fn resolve_password(
        &self,
        identity: &ControllerIdentity,
        options: ResolveOptions,
    ) -> Result<ResolvedPassword, CoreError> {
        let key = CredentialKey::controller(identity.id);

        if options.use_stored {
            if let Some(secret) = self.read_stored(&key).await {
                debug!(controller = %identity.id, "using stored password");
                return Ok(ResolvedPassword::Password {
                    secret,
                    source: PasswordSource::Store,
                });
            }
        }

        let prompt = match (&self.prompt, options.allow_interactive) {
            (Some(prompt), true) => prompt,
            _ => return Ok(ResolvedPassword::NotFound),
        };

        let request = PromptRequest {
            controller: identity.display_name(),
            url: identity.url.clone(),
            username: identity.username.clone(),
            reason: options.reason,
            confirm: options.reason == PromptReason::FirstConnect,
        };

        match prompt.prompt(request).await? {
            Some(secret) if !secret.expose_secret().is_empty() => Ok(ResolvedPassword::Password {
                secret,
                source: PasswordSource::Prompt,
            }),
            _ => {
                debug!(controller = %identity.id, "password prompt dismissed");
                Ok(ResolvedPassword::UserCancelled)
            }
        }
    }

    /// Store errors degrade to "nothing stored".
    async fn read_stored(&self, key: &CredentialKey) -> Option<SecretString> {
        match self.store.read(key).await {
            Ok(secret) => secret,
            Err(e) => {
                warn!(key = %key, error = %e, "credential store read failed; treating as absent");
                None
            }
        }
    }

    pub async fn store_password(
        &self,
        key: &CredentialKey,
        secret: &SecretString,
    ) -> Result<(), CoreError> {
        self.store.write(key, secret).await
    }

    /// Remove the controller's password and every per-resource password
    /// listed in `resources`.
    pub async fn forget(&self, id: ControllerId, resources: &[CredentialKey]) {
        let controller_key = CredentialKey::controller(id);
        for key in std::iter::once(&controller_key).chain(resources) {
            if let Err(e) = self.store.delete(key).await {
                warn!(key = %key, error = %e, "failed to delete stored credential");
            }
        }
    }
}

// ── In-memory store ─────────────────────────────────────────────────

/// Process-local credential store for tests and non-persistent sessions.
#[derive(Default)]
pub struct MemoryCredentialStore {
    entries: Mutex<HashMap<CredentialKey, SecretString>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &CredentialKey) -> bool {
        self.entries
            .lock()
            .map(|m| m.contains_key(key))
            .unwrap_or(false)
    }
}

fn poisoned() -> CoreError {
    CoreError::CredentialStore {
        message: "memory store lock poisoned".into(),
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn read(&self, key: &CredentialKey) -> Result<Option<SecretString>, CoreError> {
        let entries = self.entries.lock().map_err(|_| poisoned())?;
        Ok(entries.get(key).cloned())
    }

    async fn write(&self, key: &CredentialKey, secret: &SecretString) -> Result<(), CoreError> {
        let mut entries = self.entries.lock().map_err(|_| poisoned())?;
        entries.insert(key.clone(), secret.clone());
        Ok(())
    }

    async fn delete(&self, key: &CredentialKey) -> Result<(), CoreError> {
        let mut entries = self.entries.lock().map_err(|_| poisoned())?;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted prompt: pops one answer per call, `None` once exhausted.
    #[derive(Default)]
    pub(crate) struct ScriptedPrompt {
        answers: Mutex<VecDeque<Option<String>>>,
        pub(crate) calls: AtomicUsize,
        pub(crate) last_confirm: Mutex<Option<bool>>,
    }

    impl ScriptedPrompt {
        pub(crate) fn new(answers: impl IntoIterator<Item = Option<&'static str>>) -> Self {
            Self {
                answers: Mutex::new(answers.into_iter().map(|a| a.map(str::to_owned)).collect()),
                ..Self::default()
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PasswordPrompt for ScriptedPrompt {
        async fn prompt(&self, request: PromptRequest) -> Result<Option<SecretString>, CoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_confirm.lock().unwrap() = Some(request.confirm);
            let answer = self.answers.lock().unwrap().pop_front().flatten();
            Ok(answer.map(SecretString::from))
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl CredentialStore for BrokenStore {
        async fn read(&self, _: &CredentialKey) -> Result<Option<SecretString>, CoreError> {
            Err(CoreError::CredentialStore {
                message: "locked".into(),
            })
        }
        async fn write(&self, _: &CredentialKey, _: &SecretString) -> Result<(), CoreError> {
            Ok(())
        }
        async fn delete(&self, _: &CredentialKey) -> Result<(), CoreError> {
            Ok(())
        }
    }

    pub(crate) fn identity(remember: bool) -> ControllerIdentity {
        ControllerIdentity::new(
            Url::parse("https://dc.local:30080").unwrap(),
            "arc",
            "admin",
            remember,
            Some("dc".into()),
        )
    }

    fn opts(allow_interactive: bool, use_stored: bool) -> ResolveOptions {
        ResolveOptions {
            allow_interactive,
            use_stored,
            reason: PromptReason::MissingPassword,
        }
    }

    #[test]
    fn composite_keys() {
        let id = ControllerId::generate();
        assert_eq!(CredentialKey::controller(id).as_str(), id.to_string());
        assert_eq!(
            CredentialKey::resource(id, ResourceType::PostgresInstances, "pg-1").to_string(),
            format!("{id}::postgresInstances::pg-1")
        );
    }

    #[tokio::test]
    async fn stored_password_skips_prompt() {
        let store = Arc::new(MemoryCredentialStore::new());
        let prompt = Arc::new(ScriptedPrompt::new([Some("typed")]));
        let broker = CredentialBroker::new(store.clone(), Some(prompt.clone()));
        let id = identity(true);
        broker
            .store_password(&CredentialKey::controller(id.id), &SecretString::from("saved"))
            .await
            .unwrap();

        let resolved = broker.resolve_password(&id, opts(true, true)).await.unwrap();
        match resolved {
            ResolvedPassword::Password { secret, source } => {
                assert_eq!(secret.expose_secret(), "saved");
                assert_eq!(source, PasswordSource::Store);
            }
            other => panic!("expected stored password, got {other:?}"),
        }
        assert_eq!(prompt.calls(), 0);
    }

    #[tokio::test]
    async fn store_failure_falls_through_to_prompt() {
        let prompt = Arc::new(ScriptedPrompt::new([Some("typed")]));
        let broker = CredentialBroker::new(Arc::new(BrokenStore), Some(prompt.clone()));

        let resolved = broker
            .resolve_password(&identity(true), opts(true, true))
            .await
            .unwrap();
        assert!(matches!(
            resolved,
            ResolvedPassword::Password {
                source: PasswordSource::Prompt,
                ..
            }
        ));
        assert_eq!(prompt.calls(), 1);
    }

    #[tokio::test]
    async fn dismissed_prompt_is_cancellation() {
        let prompt = Arc::new(ScriptedPrompt::new([None]));
        let broker = CredentialBroker::new(Arc::new(MemoryCredentialStore::new()), Some(prompt));
        let resolved = broker
            .resolve_password(&identity(false), opts(true, false))
            .await
            .unwrap();
        assert!(matches!(resolved, ResolvedPassword::UserCancelled));
    }

    #[tokio::test]
    async fn non_interactive_without_store_is_not_found() {
        let prompt = Arc::new(ScriptedPrompt::new([Some("typed")]));
        let broker =
            CredentialBroker::new(Arc::new(MemoryCredentialStore::new()), Some(prompt.clone()));
        let resolved = broker
            .resolve_password(&identity(true), opts(false, true))
            .await
            .unwrap();
        assert!(matches!(resolved, ResolvedPassword::NotFound));
        assert_eq!(prompt.calls(), 0);
    }

    #[tokio::test]
    async fn first_connect_asks_for_confirmation() {
        let prompt = Arc::new(ScriptedPrompt::new([Some("pw")]));
        let broker =
            CredentialBroker::new(Arc::new(MemoryCredentialStore::new()), Some(prompt.clone()));
        let options = ResolveOptions {
            allow_interactive: true,
            use_stored: false,
            reason: PromptReason::FirstConnect,
        };
        broker.resolve_password(&identity(true), options).await.unwrap();
        assert_eq!(*prompt.last_confirm.lock().unwrap(), Some(true));
    }

    #[tokio::test]
    async fn forget_removes_controller_and_resource_keys() {
        let store = Arc::new(MemoryCredentialStore::new());
        let broker = CredentialBroker::new(store.clone(), None);
        let id = ControllerId::generate();
        let own = CredentialKey::controller(id);
        let res = CredentialKey::resource(id, ResourceType::SqlManagedInstances, "sql-1");
        let secret = SecretString::from("x");
        broker.store_password(&own, &secret).await.unwrap();
        broker.store_password(&res, &secret).await.unwrap();

        broker.forget(id, std::slice::from_ref(&res)).await;
        assert!(!store.contains(&own));
        assert!(!store.contains(&res));
    }
}
